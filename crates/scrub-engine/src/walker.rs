//! Iterative traversal of discussion trees
//!
//! Every text slot of a tree is collected up front with an explicit stack.
//! Depth and id checks therefore finish before any field is rewritten.

use std::collections::HashSet;
use std::sync::Arc;

use scrub_core::{Answer, DiscussionNode, Error, Followup, Post, Reply, Result};
use scrub_security::NameRedactor;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Counters for one redacted tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    pub nodes: usize,
    /// Text fields passed through the redactor, empty ones included
    pub fields: usize,
    pub names_redacted: usize,
    pub degraded_fields: usize,
}

pub struct TreeWalker {
    redactor: Arc<NameRedactor>,
    max_depth: usize,
}

impl TreeWalker {
    pub fn new(redactor: Arc<NameRedactor>, max_depth: usize) -> Self {
        Self {
            redactor,
            max_depth,
        }
    }

    /// Redact every text field of the tree rooted at `node`
    pub async fn redact_tree(&self, node: DiscussionNode) -> Result<DiscussionNode> {
        let (node, _) = self.redact_node(node).await?;
        Ok(node)
    }

    pub async fn redact_node(&self, mut node: DiscussionNode) -> Result<(DiscussionNode, TreeStats)> {
        let stats = {
            let mut collector = SlotCollector::new(self.max_depth);
            match &mut node {
                DiscussionNode::Post(post) => collector.post(post)?,
                DiscussionNode::StudentAnswer(answer) | DiscussionNode::InstructorAnswer(answer) => {
                    collector.answer(answer, 0)?
                }
                DiscussionNode::Followup(followup) => collector.followup(followup, 0)?,
                DiscussionNode::Reply(reply) => collector.reply_chain(reply, 0)?,
            }
            self.rewrite(collector).await?
        };
        Ok((node, stats))
    }

    pub async fn redact_post(&self, mut post: Post) -> Result<(Post, TreeStats)> {
        let stats = {
            let mut collector = SlotCollector::new(self.max_depth);
            collector.post(&mut post)?;
            self.rewrite(collector).await?
        };
        Ok((post, stats))
    }

    async fn rewrite(&self, collector: SlotCollector<'_>) -> Result<TreeStats> {
        let mut stats = TreeStats {
            nodes: collector.nodes,
            ..TreeStats::default()
        };

        // Each slot is fed exactly once and never together with its ancestors
        for slot in collector.slots {
            let redaction = self.redactor.redact(slot.text.as_str()).await?;
            *slot.text = redaction.text;

            stats.fields += 1;
            stats.names_redacted += redaction.names;
            if redaction.degraded {
                stats.degraded_fields += 1;
            }
            if redaction.names > 0 {
                debug!(node = %slot.node_id, field = slot.field, names = redaction.names, "Redacted names");
            }
        }

        Ok(stats)
    }
}

struct Slot<'a> {
    node_id: String,
    field: &'static str,
    text: &'a mut String,
}

struct SlotCollector<'a> {
    slots: Vec<Slot<'a>>,
    seen: HashSet<String>,
    pending: Vec<(&'a mut Reply, usize)>,
    nodes: usize,
    max_depth: usize,
}

impl<'a> SlotCollector<'a> {
    fn new(max_depth: usize) -> Self {
        Self {
            slots: Vec::new(),
            seen: HashSet::new(),
            pending: Vec::new(),
            nodes: 0,
            max_depth,
        }
    }

    fn visit(&mut self, id: &str, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(Error::DepthExceeded {
                depth,
                limit: self.max_depth,
            });
        }
        if !id.is_empty() && !self.seen.insert(id.to_string()) {
            return Err(Error::MalformedInput(format!(
                "node id '{}' appears more than once",
                id
            )));
        }
        self.nodes += 1;
        Ok(())
    }

    fn push(&mut self, node_id: &str, field: &'static str, text: &'a mut String) {
        self.slots.push(Slot {
            node_id: node_id.to_string(),
            field,
            text,
        });
    }

    fn post(&mut self, post: &'a mut Post) -> Result<()> {
        let post_id = post.id();
        let Post {
            subject,
            content,
            student_answer,
            instructor_answer,
            followups,
            ..
        } = post;

        self.visit(&post_id, 0)?;
        self.push(&post_id, "subject", subject);
        self.push(&post_id, "content", content);

        if let Some(Some(answer)) = student_answer.as_mut() {
            self.answer(answer, 1)?;
        }
        if let Some(Some(answer)) = instructor_answer.as_mut() {
            self.answer(answer, 1)?;
        }
        for followup in followups.iter_mut().flatten() {
            self.followup(followup, 1)?;
        }
        Ok(())
    }

    fn answer(&mut self, answer: &'a mut Answer, depth: usize) -> Result<()> {
        let id = answer.id();
        self.visit(&id, depth)?;
        self.push(&id, "content", &mut answer.content);
        Ok(())
    }

    fn followup(&mut self, followup: &'a mut Followup, depth: usize) -> Result<()> {
        let id = followup.id();
        let Followup {
            content, replies, ..
        } = followup;

        self.visit(&id, depth)?;
        self.push(&id, "content", content);
        for reply in replies.iter_mut().flatten().rev() {
            self.pending.push((reply, depth + 1));
        }
        self.drain()
    }

    fn reply_chain(&mut self, reply: &'a mut Reply, depth: usize) -> Result<()> {
        self.pending.push((reply, depth));
        self.drain()
    }

    /// Visit queued replies depth-first, children in order
    fn drain(&mut self) -> Result<()> {
        while let Some((reply, depth)) = self.pending.pop() {
            let id = reply.id();
            let Reply {
                content, replies, ..
            } = reply;

            self.visit(&id, depth)?;
            self.push(&id, "content", content);
            for child in replies.iter_mut().flatten().rev() {
                self.pending.push((child, depth + 1));
            }
        }
        Ok(())
    }
}
