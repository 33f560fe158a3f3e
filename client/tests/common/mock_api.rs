//! In-process stand-in for the portal API.
//!
//! Mirrors the response envelopes and status codes of the real service for
//! the endpoints the tests touch. Tokens are HS256 JWTs, but validity is
//! decided by the server-side token table so tests can revoke them.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, Query, Request, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

const SECRET: &[u8] = b"mock-api-secret";

#[derive(Debug, Clone)]
struct Account {
    id: String,
    name: String,
    email: String,
    password: String,
    role: String,
}

impl Account {
    fn new(id: &str, name: &str, email: &str, role: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password: "x".to_string(),
            role: role.to_string(),
        }
    }

    fn json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "role": self.role,
            "created_at": "2024-09-01T08:00:00+00:00",
            "updated_at": "2024-09-01T08:00:00",
            "courses_enrolled": [],
        })
    }

    fn is(&self, role: &str) -> bool {
        self.role == role
    }
}

#[derive(Serialize)]
struct Claims {
    sub: String,
    exp: i64,
    jti: usize,
}

fn sign(user_id: &str, exp: i64, jti: usize) -> String {
    encode(
        &Header::default(),
        &Claims {
            sub: user_id.to_string(),
            exp,
            jti,
        },
        &EncodingKey::from_secret(SECRET),
    )
    .unwrap()
}

#[derive(Debug, Default)]
struct Db {
    accounts: Vec<Account>,
    tokens: HashMap<String, String>,
    courses: Vec<Value>,
    enrollments: Vec<(i64, String)>,
    grades: Vec<Value>,
    issued: usize,
}

impl Db {
    fn seeded() -> Self {
        Self {
            accounts: vec![
                Account::new("1", "Ada Admin", "admin@u.edu", "Administrator"),
                Account::new("2", "Paul Prof", "prof@u.edu", "Professor"),
                Account::new("3", "Sam Student", "student@u.edu", "Student"),
            ],
            courses: vec![
                json!({"id": 1, "name": "Compilers", "professor_id": 2}),
                json!({"id": 2, "name": "Databases", "professor_id": 2}),
                json!({"id": 3, "name": "Networks", "professor_id": 2}),
            ],
            enrollments: vec![(1, "3".to_string())],
            grades: vec![json!({
                "id": 1,
                "course_id": 1,
                "student_id": "3",
                "grade": 17.5,
                "name": "Midterm",
            })],
            ..Default::default()
        }
    }

    fn issue(&mut self, user_id: &str) -> String {
        self.issued += 1;
        let token = sign(
            user_id,
            (Utc::now() + Duration::hours(1)).timestamp(),
            self.issued,
        );
        self.tokens.insert(token.clone(), user_id.to_string());
        token
    }

    fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }
}

#[derive(Debug, Default)]
struct Inner {
    db: Mutex<Db>,
    hits: AtomicUsize,
}

impl Inner {
    fn db(&self) -> MutexGuard<'_, Db> {
        self.db.lock().unwrap()
    }

    /// The account behind the request's bearer token
    fn caller(&self, headers: &HeaderMap) -> Result<Account, Response> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        let Some(token) = token else {
            return Err(reply(
                StatusCode::UNAUTHORIZED,
                json!({"msg": "Missing Authorization Header."}),
            ));
        };

        let db = self.db();
        db.tokens
            .get(token)
            .and_then(|id| db.account(id))
            .cloned()
            .ok_or_else(|| reply(StatusCode::UNAUTHORIZED, json!({"msg": "Token has expired."})))
    }
}

type Shared = Arc<Inner>;

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn forbidden() -> Response {
    reply(StatusCode::FORBIDDEN, json!({"msg": "Unauthorized access."}))
}

macro_rules! caller {
    ($inner:expr, $headers:expr) => {
        match $inner.caller(&$headers) {
            Ok(account) => account,
            Err(response) => return response,
        }
    };
}

async fn count_hits(State(inner): State<Shared>, request: Request, next: Next) -> Response {
    inner.hits.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

async fn login(State(inner): State<Shared>, Json(body): Json<Value>) -> Response {
    let (Some(email), Some(password)) = (body["email"].as_str(), body["password"].as_str()) else {
        return reply(StatusCode::BAD_REQUEST, json!({"error": "Credentials required"}));
    };

    let mut db = inner.db();
    let Some(account) = db
        .accounts
        .iter()
        .find(|account| account.email == email && account.password == password)
        .cloned()
    else {
        return reply(StatusCode::UNAUTHORIZED, json!({"error": "Invalid credentials"}));
    };

    let token = db.issue(&account.id);
    reply(
        StatusCode::OK,
        json!({"access_token": token, "user": account.json()}),
    )
}

async fn register(State(inner): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let fields = ["name", "email", "password", "role"].map(|field| body[field].as_str());
    let [Some(name), Some(email), Some(password), Some(role)] = fields else {
        return reply(StatusCode::BAD_REQUEST, json!({"error": "Missing required fields"}));
    };

    let creator = if headers.contains_key(AUTHORIZATION) {
        Some(caller!(inner, headers))
    } else {
        None
    };
    let may_create = match &creator {
        Some(account) => account.is("Administrator") || role == "Student",
        None => role == "Student",
    };
    if !may_create {
        return forbidden();
    }

    let mut db = inner.db();
    if db.accounts.iter().any(|account| account.email == email) {
        return reply(StatusCode::CONFLICT, json!({"error": "Email already in use"}));
    }
    let id = (db.accounts.len() + 1).to_string();
    db.accounts.push(Account {
        password: password.to_string(),
        ..Account::new(&id, name, email, role)
    });
    reply(StatusCode::OK, json!({"message": "User created", "id": id}))
}

async fn change_password(
    State(inner): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let account = caller!(inner, headers);
    let (Some(old), Some(new)) = (body["old_password"].as_str(), body["new_password"].as_str())
    else {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({"error": "Old and new passwords required"}),
        );
    };
    if old != account.password {
        return reply(
            StatusCode::UNAUTHORIZED,
            json!({"error": "Old password is incorrect"}),
        );
    }

    let mut db = inner.db();
    if let Some(stored) = db.accounts.iter_mut().find(|a| a.id == account.id) {
        stored.password = new.to_string();
    }
    reply(StatusCode::OK, json!({"message": "Password updated successfully"}))
}

async fn list_users(State(inner): State<Shared>, headers: HeaderMap) -> Response {
    let account = caller!(inner, headers);
    if !account.is("Administrator") {
        return forbidden();
    }
    let users: Vec<Value> = inner.db().accounts.iter().map(Account::json).collect();
    reply(StatusCode::OK, json!({"users": users}))
}

async fn get_user(State(inner): State<Shared>, Path(id): Path<String>, headers: HeaderMap) -> Response {
    let account = caller!(inner, headers);
    let db = inner.db();
    let Some(user) = db.account(&id) else {
        return reply(StatusCode::NOT_FOUND, json!({"msg": "User not found."}));
    };
    if !account.is("Administrator") && account.id != id {
        return forbidden();
    }
    reply(StatusCode::OK, json!({"user": user.json()}))
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<usize>,
    per_page: Option<usize>,
}

async fn list_courses(
    State(inner): State<Shared>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Response {
    caller!(inner, headers);
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).max(1);

    let db = inner.db();
    let total = db.courses.len();
    let courses: Vec<Value> = db
        .courses
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();

    reply(
        StatusCode::OK,
        json!({
            "courses": courses,
            "pagination": {
                "page": page,
                "per_page": per_page,
                "total_pages": total.div_ceil(per_page),
                "total_items": total,
            }
        }),
    )
}

async fn join_course(State(inner): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let account = caller!(inner, headers);
    if !account.is("Student") {
        return reply(
            StatusCode::FORBIDDEN,
            json!({"msg": "Only students can join courses."}),
        );
    }
    let Some(course_id) = body["course_id"].as_str().and_then(|id| id.parse::<i64>().ok()) else {
        return reply(StatusCode::BAD_REQUEST, json!({"msg": "Course ID is required."}));
    };

    let mut db = inner.db();
    if !db.courses.iter().any(|course| course["id"] == course_id) {
        return reply(StatusCode::NOT_FOUND, json!({"msg": "Course not found."}));
    }
    let enrollment = (course_id, account.id.clone());
    if db.enrollments.contains(&enrollment) {
        return reply(
            StatusCode::CONFLICT,
            json!({"msg": "Already enrolled in this course."}),
        );
    }
    db.enrollments.push(enrollment);
    reply(StatusCode::OK, json!({"msg": "Joined course successfully."}))
}

async fn list_grades(State(inner): State<Shared>, headers: HeaderMap) -> Response {
    let account = caller!(inner, headers);
    let db = inner.db();
    let grades: Vec<Value> = db
        .grades
        .iter()
        .filter(|grade| !account.is("Student") || grade["student_id"] == account.id.as_str())
        .cloned()
        .collect();
    reply(StatusCode::OK, json!({"grades": grades}))
}

async fn assign_grade(State(inner): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let account = caller!(inner, headers);
    if account.is("Student") {
        return forbidden();
    }
    let (Some(course_id), Some(student_id), Some(value)) = (
        body["course_id"].as_str(),
        body["student_id"].as_str(),
        body["grade"].as_f64(),
    ) else {
        return reply(StatusCode::BAD_REQUEST, json!({"msg": "All fields are required."}));
    };

    let mut db = inner.db();
    let grade = json!({
        "id": db.grades.len() + 1,
        "course_id": course_id,
        "student_id": student_id,
        "grade": value,
        "name": body["grade_name"],
    });
    db.grades.push(grade.clone());
    reply(
        StatusCode::OK,
        json!({"msg": "Grade assigned successfully.", "grade": grade}),
    )
}

/// Handle on a running mock API
#[derive(Clone)]
pub struct MockApi {
    addr: SocketAddr,
    inner: Shared,
}

impl MockApi {
    pub async fn start() -> Self {
        let inner: Shared = Arc::new(Inner {
            db: Mutex::new(Db::seeded()),
            hits: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/auth/change-password", post(change_password))
            .route("/users", get(list_users))
            .route("/users/{id}", get(get_user))
            .route("/courses", get(list_courses))
            .route("/courses/join", post(join_course))
            .route("/grades", get(list_grades).post(assign_grade))
            .layer(middleware::from_fn_with_state(inner.clone(), count_hits))
            .with_state(inner.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, inner }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of requests served so far
    pub fn hits(&self) -> usize {
        self.inner.hits.load(Ordering::SeqCst)
    }

    /// Server-side expiry of every issued token
    pub fn revoke_tokens(&self) {
        self.inner.db().tokens.clear();
    }

    pub fn set_role(&self, user_id: &str, role: &str) {
        let mut db = self.inner.db();
        if let Some(account) = db.accounts.iter_mut().find(|a| a.id == user_id) {
            account.role = role.to_string();
        }
    }

    /// A well-formed token whose `exp` claim already passed
    pub fn expired_token(&self, user_id: &str) -> String {
        sign(user_id, (Utc::now() - Duration::hours(1)).timestamp(), 0)
    }
}
