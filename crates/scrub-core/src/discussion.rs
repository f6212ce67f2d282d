//! Discussion tree as handed over by the scraping collaborator
//!
//! Only `subject` and `content` fields are ever rewritten by redaction.
//! Everything else is metadata and must round-trip unchanged, so records type
//! just the fields the engine walks or rewrites and keep the rest verbatim in
//! `metadata`. Child keys remember whether they were absent or `null`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Role of a node's author, decided once at ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorType {
    Instructor,
    Ta,
    Student,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_type: Option<AuthorType>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub student_answer: Option<Option<Answer>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub instructor_answer: Option<Option<Answer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followups: Option<Vec<Followup>>,
    /// `post_id`, timestamps, folders, counters and anything else
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Post {
    pub fn new(post_id: impl Into<String>, subject: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            content: content.into(),
            author_type: None,
            student_answer: None,
            instructor_answer: None,
            followups: None,
            metadata: Map::new(),
        }
        .with_metadata("post_id", Value::String(post_id.into()))
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_followup(mut self, followup: Followup) -> Self {
        self.followups.get_or_insert_with(Vec::new).push(followup);
        self
    }

    pub fn with_instructor_answer(mut self, answer: Answer) -> Self {
        self.instructor_answer = Some(Some(answer));
        self
    }

    pub fn with_student_answer(mut self, answer: Answer) -> Self {
        self.student_answer = Some(Some(answer));
        self
    }

    /// Post id as text; empty when missing or `null`
    pub fn id(&self) -> String {
        node_id(&self.metadata, "post_id")
    }

    pub fn student_answer(&self) -> Option<&Answer> {
        self.student_answer.as_ref().and_then(Option::as_ref)
    }

    pub fn instructor_answer(&self) -> Option<&Answer> {
        self.instructor_answer.as_ref().and_then(Option::as_ref)
    }

    pub fn followups(&self) -> &[Followup] {
        self.followups.as_deref().unwrap_or(&[])
    }
}

/// Student or instructor answer attached to a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_type: Option<AuthorType>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Answer {
    pub fn new(id: impl Into<String>, content: impl Into<String>, author_type: AuthorType) -> Self {
        let mut metadata = Map::new();
        metadata.insert("id".to_string(), Value::String(id.into()));
        Self {
            content: content.into(),
            author_type: Some(author_type),
            metadata,
        }
    }

    pub fn id(&self) -> String {
        node_id(&self.metadata, "id")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Followup {
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_type: Option<AuthorType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<Reply>>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Followup {
    pub fn new(id: impl Into<String>, content: impl Into<String>, author_type: AuthorType) -> Self {
        let mut metadata = Map::new();
        metadata.insert("id".to_string(), Value::String(id.into()));
        Self {
            content: content.into(),
            author_type: Some(author_type),
            replies: Some(Vec::new()),
            metadata,
        }
    }

    pub fn with_reply(mut self, reply: Reply) -> Self {
        self.replies.get_or_insert_with(Vec::new).push(reply);
        self
    }

    pub fn id(&self) -> String {
        node_id(&self.metadata, "id")
    }

    pub fn replies(&self) -> &[Reply] {
        self.replies.as_deref().unwrap_or(&[])
    }
}

/// Reply to a followup; replies nest without bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_type: Option<AuthorType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<Reply>>,
    /// `id`, `type` (feedback or followup), timestamps
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Reply {
    pub fn new(id: impl Into<String>, content: impl Into<String>, author_type: AuthorType) -> Self {
        let mut metadata = Map::new();
        metadata.insert("id".to_string(), Value::String(id.into()));
        metadata.insert("type".to_string(), Value::String("feedback".to_string()));
        Self {
            content: content.into(),
            author_type: Some(author_type),
            replies: None,
            metadata,
        }
    }

    pub fn with_reply(mut self, reply: Reply) -> Self {
        self.replies.get_or_insert_with(Vec::new).push(reply);
        self
    }

    pub fn id(&self) -> String {
        node_id(&self.metadata, "id")
    }

    pub fn replies(&self) -> &[Reply] {
        self.replies.as_deref().unwrap_or(&[])
    }
}

/// Scraper ids are strings; post ids fall back to the numeric post number
fn node_id(metadata: &Map<String, Value>, key: &str) -> String {
    match metadata.get(key) {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// `Some(None)` for an explicit `null`, `None` (via `default`) when absent
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Any text-bearing unit of a thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum DiscussionNode {
    Post(Post),
    StudentAnswer(Answer),
    InstructorAnswer(Answer),
    Followup(Followup),
    Reply(Reply),
}

impl DiscussionNode {
    /// Number of nodes in the tree rooted here, walked without recursion
    pub fn node_count(&self) -> usize {
        let mut count = 1;
        let mut replies: Vec<&Reply> = Vec::new();

        match self {
            DiscussionNode::Post(post) => {
                count += post.student_answer().iter().count();
                count += post.instructor_answer().iter().count();
                for followup in post.followups() {
                    count += 1;
                    replies.extend(followup.replies());
                }
            }
            DiscussionNode::StudentAnswer(_) | DiscussionNode::InstructorAnswer(_) => {}
            DiscussionNode::Followup(followup) => replies.extend(followup.replies()),
            DiscussionNode::Reply(reply) => replies.extend(reply.replies()),
        }

        while let Some(reply) = replies.pop() {
            count += 1;
            replies.extend(reply.replies());
        }

        count
    }
}

impl From<Post> for DiscussionNode {
    fn from(post: Post) -> Self {
        DiscussionNode::Post(post)
    }
}
