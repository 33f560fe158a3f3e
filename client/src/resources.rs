use std::fmt;
use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use portal_auth::{CredentialChannel, CredentialRejection, CredentialToken};
use portal_core::{
    Course, CoursePage, Grade, NewGrade, NewUser, PortalError, PortalResult, User, UserUpdate,
};

use crate::http::{ApiClient, ApiFailure, MessageSource};

/// Typed access to the portal's resource endpoints.
///
/// Every call carries the token currently attached to the session's
/// credential channel. A refusal of that token is reported to the session
/// through the `CredentialRejection` hook and returned as is, never retried.
#[derive(Clone)]
pub struct ResourceClient {
    api: ApiClient,
    channel: CredentialChannel,
    rejection: Arc<dyn CredentialRejection>,
}

impl fmt::Debug for ResourceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("api", &self.api)
            .field("attached", &self.channel.is_attached())
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct Ack {
    #[serde(alias = "message")]
    msg: Option<String>,
}

impl Ack {
    fn text(self) -> String {
        self.msg.unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct UsersEnvelope {
    users: Vec<User>,
}

#[derive(Deserialize)]
struct StudentsEnvelope {
    students: Vec<User>,
}

#[derive(Deserialize)]
struct CourseEnvelope {
    course: Course,
}

#[derive(Deserialize)]
struct CoursesEnvelope {
    courses: Vec<Course>,
}

#[derive(Deserialize)]
struct GradeEnvelope {
    grade: Grade,
}

#[derive(Deserialize)]
struct GradesEnvelope {
    grades: Vec<Grade>,
}

#[derive(Deserialize)]
struct Registered {
    #[serde(deserialize_with = "portal_core::de_id")]
    id: String,
}

#[derive(Serialize)]
struct PasswordChange<'a> {
    old_password: &'a str,
    new_password: &'a str,
}

impl ResourceClient {
    pub fn new(
        api: ApiClient,
        channel: CredentialChannel,
        rejection: Arc<dyn CredentialRejection>,
    ) -> Self {
        Self {
            api,
            channel,
            rejection,
        }
    }

    /// Request with the attached bearer token; fails without one
    fn authorized(&self, method: Method, path: &str) -> PortalResult<(RequestBuilder, CredentialToken)> {
        let token = self
            .channel
            .current()
            .ok_or_else(|| PortalError::Unauthorized("Not logged in".to_string()))?;
        let request = self.api.request(method, path).bearer_auth(token.expose());
        Ok((request, token))
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: &CredentialToken,
    ) -> PortalResult<T> {
        match self.api.send(request).await {
            Err(e) if e.is_unauthorized() => {
                warn!(error = %e, "Attached credential refused by the API");
                self.rejection.credential_rejected(token);
                Err(e)
            }
            other => other,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> PortalResult<T> {
        let (request, token) = self.authorized(Method::GET, path)?;
        self.dispatch(request, &token).await
    }

    async fn send_json<T, B>(&self, method: Method, path: &str, body: &B) -> PortalResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let (request, token) = self.authorized(method, path)?;
        self.dispatch(request.json(body), &token).await
    }

    async fn delete(&self, path: &str) -> PortalResult<String> {
        let (request, token) = self.authorized(Method::DELETE, path)?;
        let ack: Ack = self.dispatch(request, &token).await?;
        Ok(ack.text())
    }

    // Auth

    /// Create an account. Anonymous callers may only register students; an
    /// attached administrator token allows any role.
    pub async fn register(&self, user: &NewUser) -> PortalResult<String> {
        match self.channel.current() {
            Some(token) => {
                let request = self
                    .api
                    .request(Method::POST, "/auth/register")
                    .bearer_auth(token.expose())
                    .json(user);
                let registered: Registered = self.dispatch(request, &token).await?;
                Ok(registered.id)
            }
            None => {
                let request = self.api.request(Method::POST, "/auth/register").json(user);
                let registered: Registered = self.api.send(request).await?;
                Ok(registered.id)
            }
        }
    }

    /// The API answers a wrong old password with 401 as well. Only a 401 the
    /// password controller wrote itself (under `error`) means a wrong
    /// password; a token-layer refusal ends the session like anywhere else.
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> PortalResult<String> {
        let (request, token) = self.authorized(Method::POST, "/auth/change-password")?;
        let response = request
            .json(&PasswordChange {
                old_password,
                new_password,
            })
            .send()
            .await?;

        if response.status().is_success() {
            let ack: Ack = response.json().await?;
            return Ok(ack.text());
        }

        let failure = ApiFailure::read(response).await;
        if failure.status == 401 && failure.source == MessageSource::Error {
            debug!(message = %failure.message, "Password change refused");
            return Err(PortalError::InvalidCredentials);
        }

        let e = failure.into_error();
        if e.is_unauthorized() {
            warn!(error = %e, "Attached credential refused by the API");
            self.rejection.credential_rejected(&token);
        }
        Err(e)
    }

    // Users

    pub async fn list_users(&self) -> PortalResult<Vec<User>> {
        let body: UsersEnvelope = self.get("/users").await?;
        Ok(body.users)
    }

    pub async fn get_user(&self, user_id: &str) -> PortalResult<User> {
        let body: UserEnvelope = self.get(&format!("/users/{}", user_id)).await?;
        Ok(body.user)
    }

    pub async fn search_users(&self, query: &str) -> PortalResult<Vec<User>> {
        let (request, token) = self.authorized(Method::GET, "/users/search")?;
        let body: UsersEnvelope = self
            .dispatch(request.query(&[("query", query)]), &token)
            .await?;
        Ok(body.users)
    }

    pub async fn create_user(&self, user: &NewUser) -> PortalResult<User> {
        let body: UserEnvelope = self.send_json(Method::POST, "/users", user).await?;
        Ok(body.user)
    }

    pub async fn update_user(&self, user_id: &str, update: &UserUpdate) -> PortalResult<User> {
        if update.is_empty() {
            return Err(PortalError::Validation("Nothing to update".to_string()));
        }
        let body: UserEnvelope = self
            .send_json(Method::PUT, &format!("/users/{}", user_id), update)
            .await?;
        Ok(body.user)
    }

    pub async fn delete_user(&self, user_id: &str) -> PortalResult<String> {
        self.delete(&format!("/users/{}", user_id)).await
    }

    // Courses

    pub async fn list_courses(&self, page: u32, per_page: u32) -> PortalResult<CoursePage> {
        let (request, token) = self.authorized(Method::GET, "/courses")?;
        self.dispatch(request.query(&[("page", page), ("per_page", per_page)]), &token)
            .await
    }

    pub async fn get_course(&self, course_id: &str) -> PortalResult<Course> {
        let body: CourseEnvelope = self.get(&format!("/courses/{}", course_id)).await?;
        Ok(body.course)
    }

    pub async fn search_courses(&self, name: &str) -> PortalResult<Vec<Course>> {
        let (request, token) = self.authorized(Method::GET, "/courses/search")?;
        let body: CoursesEnvelope = self
            .dispatch(request.query(&[("name", name)]), &token)
            .await?;
        Ok(body.courses)
    }

    pub async fn course_students(&self, course_id: &str) -> PortalResult<Vec<User>> {
        let body: StudentsEnvelope = self
            .get(&format!("/courses/{}/students", course_id))
            .await?;
        Ok(body.students)
    }

    pub async fn create_course(&self, name: &str) -> PortalResult<Course> {
        let body: CourseEnvelope = self
            .send_json(Method::POST, "/courses", &json!({ "name": name }))
            .await?;
        Ok(body.course)
    }

    pub async fn update_course(&self, course_id: &str, name: &str) -> PortalResult<Course> {
        let body: CourseEnvelope = self
            .send_json(
                Method::PUT,
                &format!("/courses/{}", course_id),
                &json!({ "name": name }),
            )
            .await?;
        Ok(body.course)
    }

    pub async fn delete_course(&self, course_id: &str) -> PortalResult<String> {
        self.delete(&format!("/courses/{}", course_id)).await
    }

    pub async fn join_course(&self, course_id: &str) -> PortalResult<String> {
        let ack: Ack = self
            .send_json(Method::POST, "/courses/join", &json!({ "course_id": course_id }))
            .await?;
        Ok(ack.text())
    }

    pub async fn leave_course(&self, course_id: &str) -> PortalResult<String> {
        let ack: Ack = self
            .send_json(Method::POST, "/courses/leave", &json!({ "course_id": course_id }))
            .await?;
        Ok(ack.text())
    }

    // Grades

    pub async fn list_grades(&self) -> PortalResult<Vec<Grade>> {
        let body: GradesEnvelope = self.get("/grades").await?;
        Ok(body.grades)
    }

    pub async fn get_grade(&self, grade_id: &str) -> PortalResult<Grade> {
        let body: GradeEnvelope = self.get(&format!("/grades/{}", grade_id)).await?;
        Ok(body.grade)
    }

    pub async fn student_grades(&self, course_id: &str, student_id: &str) -> PortalResult<Vec<Grade>> {
        let body: GradesEnvelope = self
            .get(&format!(
                "/grades/courses/{}/students/{}/grades",
                course_id, student_id
            ))
            .await?;
        Ok(body.grades)
    }

    pub async fn assign_grade(&self, grade: &NewGrade) -> PortalResult<Grade> {
        let body: GradeEnvelope = self.send_json(Method::POST, "/grades", grade).await?;
        Ok(body.grade)
    }

    pub async fn update_grade(&self, grade_id: &str, value: f64) -> PortalResult<Grade> {
        let body: GradeEnvelope = self
            .send_json(
                Method::PUT,
                &format!("/grades/{}", grade_id),
                &json!({ "grade": value }),
            )
            .await?;
        Ok(body.grade)
    }

    pub async fn delete_grade(&self, grade_id: &str) -> PortalResult<String> {
        self.delete(&format!("/grades/{}", grade_id)).await
    }
}
