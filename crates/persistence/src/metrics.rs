//! Repository query metrics.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Publishes the size of the connection pool and how many connections sit
/// idle.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("db_pool_connections", "state" => "active").set(size.saturating_sub(idle) as f64);
    gauge!("db_pool_connections", "state" => "idle").set(idle as f64);
}

/// Times one repository query. Dropping the timer without calling
/// [`QueryTimer::record`] records nothing.
///
/// ```ignore
/// let timer = QueryTimer::new("find_user_by_id");
/// let result = sqlx::query_as::<_, UserEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        histogram!("db_query_duration_seconds", "query" => self.query)
            .record(self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_keeps_name() {
        let timer = QueryTimer::new("count_users");
        assert_eq!(timer.query, "count_users");
        timer.record();
    }
}
