use serde::{Deserialize, Serialize};

/// Textual description of the remote quiz service.
pub const SERVICE_INTERFACE: &str = r#"type CarId = nat;
type Option = record { id : nat; price : nat };
type Question = record {
  carId : CarId;
  carName : text;
  carImage : text;
  options : vec Option;
};
type Guess = record { carId : CarId; selectedOptionId : nat };
type Result = record { score : nat; maxScore : nat; message : text };
service : {
  getQuestions : () -> (vec Question) query;
  submitGuesses : (vec Guess) -> (Result);
}
"#;

/// Whether a call is answered by a single replica (query) or goes through consensus (update).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Query,
    Update,
}

impl CallKind {
    /// Last path segment of the gateway endpoint serving this kind of call.
    pub fn endpoint(self) -> &'static str {
        match self {
            CallKind::Query => "query",
            CallKind::Update => "call",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanisterMethod {
    GetQuestions,
    SubmitGuesses,
}

impl CanisterMethod {
    pub fn name(self) -> &'static str {
        match self {
            CanisterMethod::GetQuestions => "getQuestions",
            CanisterMethod::SubmitGuesses => "submitGuesses",
        }
    }

    pub fn kind(self) -> CallKind {
        match self {
            CanisterMethod::GetQuestions => CallKind::Query,
            CanisterMethod::SubmitGuesses => CallKind::Update,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    pub method_name: String,
    #[serde(default)]
    pub arg: serde_json::Value,
}

impl CallRequest {
    pub fn new(method: CanisterMethod, arg: serde_json::Value) -> Self {
        Self {
            method_name: method.name().to_string(),
            arg,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallReply<T> {
    Replied {
        reply: T,
    },
    Rejected {
        reject_code: u32,
        reject_message: String,
    },
}
