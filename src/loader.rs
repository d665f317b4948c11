//! Background work for the dashboard.
//!
//! Each selection spawns four independent requests. Results come back over a
//! channel tagged with the selection's generation, and dropping a
//! [`Selection`] aborts whatever is still in flight.
//!
//! Simulation actions (next day, reset, random user, user count) run on
//! [`ActionRunner`] so the event loop keeps drawing while they are pending.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::types::{DayReport, SimpleProfile, UserId, UserProfile};
use crate::api::{ApiClient, ApiError};

#[derive(Debug)]
pub enum Panel {
    Profile(Result<UserProfile, ApiError>),
    Friends(Result<Vec<SimpleProfile>, ApiError>),
    FriendsOfFriends(Result<Vec<SimpleProfile>, ApiError>),
    Strangers(Result<Vec<SimpleProfile>, ApiError>),
}

#[derive(Debug)]
pub struct LoadResult {
    pub generation: u64,
    pub user_id: UserId,
    pub panel: Panel,
}

/// The user currently shown, owning its in-flight requests
#[derive(Debug)]
pub struct Selection {
    pub user_id: UserId,
    pub generation: u64,
    tasks: Vec<JoinHandle<()>>,
}

impl Selection {
    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(|t| t.is_finished())
    }
}

impl Drop for Selection {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

pub struct SelectionLoader {
    tx: mpsc::UnboundedSender<LoadResult>,
    rx: mpsc::UnboundedReceiver<LoadResult>,
    next_generation: u64,
}

impl SelectionLoader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            next_generation: 1,
        }
    }

    /// Start loading profile, friends and both recommendation lists
    pub fn spawn(&mut self, client: &ApiClient, user_id: UserId) -> Selection {
        let generation = self.next_generation;
        self.next_generation += 1;
        tracing::debug!(user_id, generation, "loading selection");

        let tasks = vec![
            self.spawn_one(client, user_id, generation, |c, id| async move {
                Panel::Profile(c.user_profile(id).await)
            }),
            self.spawn_one(client, user_id, generation, |c, id| async move {
                Panel::Friends(c.friends_with_profiles(id).await)
            }),
            self.spawn_one(client, user_id, generation, |c, id| async move {
                Panel::FriendsOfFriends(c.fof_with_profiles(id).await)
            }),
            self.spawn_one(client, user_id, generation, |c, id| async move {
                Panel::Strangers(c.strangers_with_profiles(id).await)
            }),
        ];

        Selection {
            user_id,
            generation,
            tasks,
        }
    }

    fn spawn_one<F, Fut>(
        &self,
        client: &ApiClient,
        user_id: UserId,
        generation: u64,
        load: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(ApiClient, UserId) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Panel> + Send + 'static,
    {
        let client = client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let panel = load(client, user_id).await;
            // Receiver only goes away on shutdown
            let _ = tx.send(LoadResult {
                generation,
                user_id,
                panel,
            });
        })
    }

    /// Collect whatever has finished without waiting
    pub fn drain(&mut self) -> Vec<LoadResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.rx.try_recv() {
            results.push(result);
        }
        results
    }

    #[cfg(test)]
    pub async fn recv(&mut self) -> Option<LoadResult> {
        self.rx.recv().await
    }
}

impl Default for SelectionLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a simulation action. Day and reset carry the refreshed user
/// count when the action itself succeeded.
#[derive(Debug)]
pub enum ActionResult {
    DayAdvanced {
        report: Result<DayReport, ApiError>,
        total: Option<Result<u64, ApiError>>,
    },
    Reset {
        result: Result<(), ApiError>,
        total: Option<Result<u64, ApiError>>,
    },
    RandomUser(Result<UserId, ApiError>),
    TotalCount(Result<u64, ApiError>),
}

pub struct ActionRunner {
    tx: mpsc::UnboundedSender<ActionResult>,
    rx: mpsc::UnboundedReceiver<ActionResult>,
}

impl ActionRunner {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn advance_day(&self, client: &ApiClient) {
        self.run(client, |c| async move {
            let report = c.simulate_day().await;
            let total = match report {
                Ok(_) => Some(c.total_count().await),
                Err(_) => None,
            };
            ActionResult::DayAdvanced { report, total }
        });
    }

    pub fn reset(&self, client: &ApiClient) {
        self.run(client, |c| async move {
            let result = c.refresh_db().await;
            let total = match result {
                Ok(()) => Some(c.total_count().await),
                Err(_) => None,
            };
            ActionResult::Reset { result, total }
        });
    }

    pub fn random_user(&self, client: &ApiClient) {
        self.run(client, |c| async move { ActionResult::RandomUser(c.random_user_id().await) });
    }

    pub fn total_count(&self, client: &ApiClient) {
        self.run(client, |c| async move { ActionResult::TotalCount(c.total_count().await) });
    }

    fn run<F, Fut>(&self, client: &ApiClient, action: F)
    where
        F: FnOnce(ApiClient) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ActionResult> + Send + 'static,
    {
        let client = client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(action(client).await);
        });
    }

    pub fn drain(&mut self) -> Vec<ActionResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.rx.try_recv() {
            results.push(result);
        }
        results
    }
}

impl Default for ActionRunner {
    fn default() -> Self {
        Self::new()
    }
}
