use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::utilities::errors::AppError;

pub trait RateLimit: Send + Sync {
    fn allow(&self, identity: &str) -> bool;
}

#[derive(Clone, Copy, Debug)]
struct Window {
    started: Instant,
    current: u32,
    previous: u32,
}

/// Per-identity sliding-window counter. The request rate is estimated from
/// the current window plus the previous window weighted by how much of it
/// still overlaps the sliding interval.
#[derive(Debug)]
pub struct SlidingWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl SlidingWindowRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window: window.max(Duration::from_secs(1)),
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn allow_at(&self, identity: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = windows.entry(identity.to_string()).or_insert(Window {
            started: now,
            current: 0,
            previous: 0,
        });

        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window * 2 {
            *entry = Window {
                started: now,
                current: 0,
                previous: 0,
            };
        } else if elapsed >= self.window {
            entry.previous = entry.current;
            entry.current = 0;
            entry.started += self.window;
        }

        let progress = now.saturating_duration_since(entry.started).as_secs_f64()
            / self.window.as_secs_f64();
        let estimate = f64::from(entry.previous) * (1.0 - progress) + f64::from(entry.current);

        if estimate >= f64::from(self.max_requests) {
            return false;
        }

        entry.current += 1;
        true
    }

    /// Drops identities idle for two full windows. Returns how many went.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let before = windows.len();
        windows.retain(|_, w| now.saturating_duration_since(w.started) < self.window * 2);
        before - windows.len()
    }

    pub fn tracked(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn spawn_sweeper(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.window);
            loop {
                interval.tick().await;
                let removed = self.sweep_at(Instant::now());
                if removed > 0 {
                    debug!("Rate limiter swept {} idle identities", removed);
                }
            }
        })
    }
}

impl RateLimit for SlidingWindowRateLimiter {
    fn allow(&self, identity: &str) -> bool {
        self.allow_at(identity, Instant::now())
    }
}

fn client_identity(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(str::to_string)
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "anonymous".to_string())
}

pub async fn rate_limit(
    State(limiter): State<Arc<dyn RateLimit>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = client_identity(&request);

    if !limiter.allow(&identity) {
        warn!("Rate limit exceeded for {}", identity);
        return Err(AppError::TooManyRequests);
    }

    Ok(next.run(request).await)
}
