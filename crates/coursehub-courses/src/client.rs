use coursehub_net::prelude::*;
use serde_json::Value;

use crate::errors::CourseError;
use crate::model::{Course, NewCourse};
use crate::search::CourseSearch;

const COURSES: &str = "/courses";

#[derive(Clone)]
pub struct CoursesApi {
    api: Api,
}

impl CoursesApi {
    pub fn new(api: Api) -> Self {
        Self { api }
    }

    /// Raw listing payload, as returned by the backend.
    pub async fn list(&self, search: &CourseSearch) -> Result<Value, CourseError> {
        let options = RequestOptions::new().with_search(Value::String(search.to_query()));
        Ok(self.api.get(COURSES, options).await?)
    }

    /// Listing decoded from the payload's `result` array; a missing array is empty.
    pub async fn list_typed(&self, search: &CourseSearch) -> Result<Vec<Course>, CourseError> {
        let payload = self.list(search).await?;
        match payload.get("result") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(result) => serde_json::from_value(result.clone())
                .map_err(|err| CourseError::Decode(err.to_string())),
        }
    }

    pub async fn upload(&self, course: &NewCourse) -> Result<Value, CourseError> {
        course.validate()?;
        let options = RequestOptions::new().with_body(course.to_payload());
        let response = self.api.post(COURSES, options).await?;
        tracing::info!(
            target: "coursehub::courses",
            title = %course.title.trim(),
            "course uploaded"
        );
        Ok(response)
    }
}
