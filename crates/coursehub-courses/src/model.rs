use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::CourseError;

/// A course as listed by the backend. Every field is optional because older
/// records are missing some of them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Course {
    pub id: Option<Value>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Value>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub thumbnail: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<u64>,
    pub instructor: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseVideo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "videoUrl", default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseSection {
    pub title: String,
    #[serde(default)]
    pub videos: Vec<CourseVideo>,
}

/// Course creation form, as submitted by the admin screen.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub level: String,
    pub tags: Vec<String>,
    pub thumbnail: String,
    pub sections: Vec<CourseSection>,
}

impl NewCourse {
    pub fn validate(&self) -> Result<(), CourseError> {
        let title = self.title.trim().chars().count();
        if !(3..=100).contains(&title) {
            return Err(CourseError::Invalid(
                "title must be 3 to 100 characters".into(),
            ));
        }
        let description = self.description.trim().chars().count();
        if !(10..=1000).contains(&description) {
            return Err(CourseError::Invalid(
                "description must be 10 to 1000 characters".into(),
            ));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CourseError::Invalid("price cannot be negative".into()));
        }
        if self.category.is_empty() {
            return Err(CourseError::Invalid("category is required".into()));
        }
        if self.level.is_empty() {
            return Err(CourseError::Invalid("level is required".into()));
        }
        if self.tags.is_empty() {
            return Err(CourseError::Invalid("at least one tag is required".into()));
        }
        if self.sections.iter().any(|s| s.title.trim().is_empty()) {
            return Err(CourseError::Invalid("section title is required".into()));
        }
        let mut videos = self.sections.iter().flat_map(|s| &s.videos);
        if videos.any(|v| v.title.trim().is_empty()) {
            return Err(CourseError::Invalid("video title is required".into()));
        }
        Ok(())
    }

    /// Upload body. Text is trimmed and the price is sent as a string.
    pub fn to_payload(&self) -> Value {
        let sections: Vec<CourseSection> = self
            .sections
            .iter()
            .map(|section| CourseSection {
                title: section.title.trim().to_string(),
                videos: section
                    .videos
                    .iter()
                    .map(|video| CourseVideo {
                        title: video.title.trim().to_string(),
                        description: video.description.as_deref().map(|d| d.trim().to_string()),
                        video_url: video.video_url.clone(),
                    })
                    .collect(),
            })
            .collect();

        json!({
            "title": self.title.trim(),
            "description": self.description.trim(),
            "price": self.price.to_string(),
            "category": self.category,
            "level": self.level,
            "tags": self.tags,
            "thumbnail": self.thumbnail,
            "sections": sections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewCourse {
        NewCourse {
            title: "  Advanced React  ".into(),
            description: "Hooks, suspense and server components.".into(),
            price: 189.99,
            category: "Web Development".into(),
            level: "Advanced".into(),
            tags: vec!["react".into()],
            thumbnail: String::new(),
            sections: vec![CourseSection {
                title: " Intro ".into(),
                videos: vec![CourseVideo {
                    title: "Welcome ".into(),
                    description: None,
                    video_url: Some("https://cdn.example.com/v/1.mp4".into()),
                }],
            }],
        }
    }

    #[test]
    fn payload_trims_and_stringifies_price() {
        let payload = sample().to_payload();
        assert_eq!(payload["title"], "Advanced React");
        assert_eq!(payload["price"], "189.99");
        assert_eq!(payload["sections"][0]["title"], "Intro");
        assert_eq!(
            payload["sections"][0]["videos"][0],
            json!({"title": "Welcome", "videoUrl": "https://cdn.example.com/v/1.mp4"})
        );
    }

    #[test]
    fn validation_mirrors_form_rules() {
        assert!(sample().validate().is_ok());

        let mut course = sample();
        course.title = "ab".into();
        assert!(course.validate().is_err());

        let mut course = sample();
        course.price = -1.0;
        assert!(course.validate().is_err());

        let mut course = sample();
        course.tags.clear();
        assert!(course.validate().is_err());

        let mut course = sample();
        course.sections[0].videos[0].title = "  ".into();
        match course.validate() {
            Err(CourseError::Invalid(msg)) => assert_eq!(msg, "video title is required"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn listing_tolerates_missing_fields() {
        let course: Course = serde_json::from_value(json!({"id": 3, "title": "UX"})).unwrap();
        assert_eq!(course.title.as_deref(), Some("UX"));
        assert!(course.tags.is_empty());
    }
}
