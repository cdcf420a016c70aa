//! Fake non-persistent resource API for integration tests
//!
//! Mirrors the public backend: writes are echoed back but never stored,
//! filters compare query strings against top-level fields.

use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use std::thread;
use tiny_http::{Header, Response, Server};

/// Ways the fake backend can deviate from the contract
#[derive(Debug, Clone, Copy)]
pub struct Behavior {
    /// Status returned for DELETE
    pub delete_status: u16,
    /// Reject malformed payloads with 400
    pub strict_validation: bool,
    /// Serve collections as text/html
    pub html_collections: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            delete_status: 200,
            strict_validation: false,
            html_collections: false,
        }
    }
}

/// Running fake backend; shuts down on drop
pub struct FakeApi {
    server: Arc<Server>,
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    join: Option<thread::JoinHandle<()>>,
}

impl FakeApi {
    pub fn start() -> Self {
        Self::with_behavior(Behavior::default())
    }

    pub fn with_behavior(behavior: Behavior) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("Failed to bind fake API"));
        let addr = server
            .server_addr()
            .to_ip()
            .expect("Fake API should listen on an IP address");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let worker = Arc::clone(&server);
        let log = Arc::clone(&requests);
        let join = thread::spawn(move || {
            let data = Dataset::seed();
            for mut request in worker.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);

                let method = request.method().to_string();
                let url = request.url().to_string();
                log.lock()
                    .expect("request log poisoned")
                    .push(format!("{} {}", method, url));

                let (status, content_type, payload) = data.handle(&behavior, &method, &url, &body);
                let mut response = Response::from_data(payload.into_bytes()).with_status_code(status);
                if let Some(content_type) = content_type {
                    response.add_header(
                        Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
                            .expect("Invalid content type header"),
                    );
                }
                let _ = request.respond(response);
            }
        });

        Self {
            server,
            base_url: format!("http://{}", addr),
            requests,
            join: Some(join),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request lines received so far, e.g. `GET /todos?userId=1`
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

const JSON: &str = "application/json; charset=utf-8";

struct Dataset {
    comments: Vec<Value>,
    todos: Vec<Value>,
}

impl Dataset {
    fn seed() -> Self {
        let emails = [
            "Eliseo@gardner.biz",
            "Jayne_Kuhic@sydney.com",
            "Nikita@garfield.biz",
            "Lew@alysha.tv",
            "Hayden@althea.biz",
        ];

        let comments = (1..=10u64)
            .map(|id| {
                json!({
                    "postId": (id - 1) / 5 + 1,
                    "id": id,
                    "name": format!("comment {}", id),
                    "email": emails[((id - 1) % 5) as usize],
                    "body": format!("body of comment {}", id),
                })
            })
            .collect();

        let todos = (1..=20u64)
            .map(|id| {
                json!({
                    "userId": (id - 1) / 10 + 1,
                    "id": id,
                    "title": format!("todo {}", id),
                    "completed": id % 3 == 0,
                })
            })
            .collect();

        Self { comments, todos }
    }

    fn collection(&self, name: &str) -> Option<&Vec<Value>> {
        match name {
            "comments" => Some(&self.comments),
            "todos" => Some(&self.todos),
            _ => None,
        }
    }

    fn handle(
        &self,
        behavior: &Behavior,
        method: &str,
        url: &str,
        body: &str,
    ) -> (u16, Option<&'static str>, String) {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        let Some(items) = segments.first().and_then(|name| self.collection(name)) else {
            return (404, Some(JSON), "{}".to_string());
        };
        let resource = segments[0];
        let payload: Value = serde_json::from_str(body).unwrap_or(Value::Null);

        match (method, segments.get(1)) {
            ("GET", None) => {
                let filtered: Vec<&Value> = items
                    .iter()
                    .filter(|item| matches_query(item, query))
                    .collect();
                let content_type = if behavior.html_collections {
                    "text/html; charset=utf-8"
                } else {
                    JSON
                };
                (200, Some(content_type), json!(filtered).to_string())
            }
            ("GET", Some(id)) => match find(items, id) {
                Some(item) => (200, Some(JSON), item.to_string()),
                None => (404, Some(JSON), "{}".to_string()),
            },
            ("POST", None) => {
                if behavior.strict_validation {
                    if let Some(problem) = validation_problem(resource, &payload, true) {
                        return rejected(&problem);
                    }
                }
                let mut created = as_object(payload);
                created.insert("id".to_string(), json!(items.len() + 1));
                (201, Some(JSON), Value::Object(created).to_string())
            }
            ("PUT", Some(id)) => {
                if find(items, id).is_none() {
                    return (404, Some(JSON), "{}".to_string());
                }
                if behavior.strict_validation {
                    if let Some(problem) = validation_problem(resource, &payload, false) {
                        return rejected(&problem);
                    }
                }
                let mut updated = as_object(payload);
                let id: u64 = id.parse().unwrap_or_default();
                updated.insert("id".to_string(), json!(id));
                (200, Some(JSON), Value::Object(updated).to_string())
            }
            ("DELETE", Some(_)) => {
                if behavior.delete_status == 200 {
                    (200, Some(JSON), "{}".to_string())
                } else {
                    (behavior.delete_status, None, String::new())
                }
            }
            _ => (404, Some(JSON), "{}".to_string()),
        }
    }
}

fn find<'a>(items: &'a [Value], id: &str) -> Option<&'a Value> {
    let id: u64 = id.parse().ok()?;
    items.iter().find(|item| item["id"] == json!(id))
}

fn matches_query(item: &Value, query: &str) -> bool {
    url::form_urlencoded::parse(query.as_bytes()).all(|(field, expected)| match item.get(&*field) {
        Some(Value::String(s)) => *s == expected,
        Some(other) => other.to_string() == expected,
        None => false,
    })
}

fn as_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn rejected(problem: &str) -> (u16, Option<&'static str>, String) {
    let body = json!({ "message": format!("validation failed: {}", problem) });
    (400, Some(JSON), body.to_string())
}

#[derive(Clone, Copy)]
enum Expect {
    Number,
    Text,
    Flag,
}

impl Expect {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Expect::Number => value.is_number(),
            Expect::Text => value.as_str().is_some_and(|s| !s.is_empty()),
            Expect::Flag => value.is_boolean(),
        }
    }
}

/// Minimal server-side validation used by the strict mode
fn validation_problem(resource: &str, payload: &Value, require_all: bool) -> Option<String> {
    let fields: &[(&str, Expect)] = match resource {
        "comments" => &[
            ("postId", Expect::Number),
            ("name", Expect::Text),
            ("email", Expect::Text),
            ("body", Expect::Text),
        ],
        "todos" => &[
            ("userId", Expect::Number),
            ("title", Expect::Text),
            ("completed", Expect::Flag),
        ],
        _ => &[],
    };

    for (name, expect) in fields {
        match payload.get(*name) {
            Some(value) if !expect.accepts(value) => {
                return Some(format!("'{}' is malformed", name))
            }
            None if require_all => return Some(format!("'{}' is required", name)),
            _ => {}
        }
    }
    None
}
