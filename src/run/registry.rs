use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Runs currently in progress, shared across runs for the exit warning.
///
/// The only state that outlives a single run.
#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    in_flight: Arc<Mutex<HashMap<Uuid, String>>>,
}

/// Marks a run in progress until dropped
#[derive(Debug)]
pub struct RunGuard {
    run_id: Uuid,
    registry: RunRegistry,
}

impl RunGuard {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.registry
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.run_id);
    }
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, post_id: &str) -> RunGuard {
        let run_id = Uuid::new_v4();
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(run_id, post_id.to_string());
        RunGuard {
            run_id,
            registry: self.clone(),
        }
    }

    pub fn any_in_progress(&self) -> bool {
        !self
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    /// Post ids of runs still in progress
    pub fn in_progress(&self) -> Vec<String> {
        let mut posts: Vec<String> = self
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        posts.sort();
        posts
    }

    /// Warning to show before exit, if anything is still downloading
    pub fn exit_warning(&self) -> Option<String> {
        let posts = self.in_progress();
        if posts.is_empty() {
            None
        } else {
            Some(format!(
                "{} download(s) still in progress (posts: {}); leaving now abandons them",
                posts.len(),
                posts.join(", ")
            ))
        }
    }
}
