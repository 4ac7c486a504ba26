//! Sorted set accessors

use crate::client::{Database, KeyValueClient};
use crate::command::Command;
use crate::connection::ManageConnection;
use crate::core::error::{ClientError, ClientResult};
use redis::ToRedisArgs;

impl<M: ManageConnection> KeyValueClient<M> {
    /// ZADD members with their scores.
    ///
    /// Fails with [`ClientError::InvalidArgument`] before anything is sent
    /// when `members` is empty.
    pub async fn sorted_set_add<I, T>(&self, db: Database, key: &str, members: I) -> ClientResult<()>
    where
        I: IntoIterator<Item = (T, f64)>,
        T: ToRedisArgs,
    {
        let mut command = Command::new("ZADD").arg(key);
        let mut count = 0usize;
        for (member, score) in members {
            command = command.arg(score).arg(member);
            count += 1;
        }
        if count == 0 {
            return Err(ClientError::InvalidArgument(
                "sorted set members must not be empty".to_string(),
            ));
        }

        self.execute(db, command).await?;
        Ok(())
    }

    /// ZCARD
    pub async fn sorted_set_cardinality(&self, db: Database, key: &str) -> ClientResult<i64> {
        self.query(db, Command::new("ZCARD").arg(key)).await
    }

    /// ZCOUNT of members scored within `[min, max]`
    pub async fn sorted_set_count_in_range(
        &self,
        db: Database,
        key: &str,
        min: i64,
        max: i64,
    ) -> ClientResult<i64> {
        self.query(db, Command::new("ZCOUNT").arg(key).arg(min).arg(max))
            .await
    }

    /// ZRANGEBYSCORE: members scored within `[min, max]`, lowest first
    pub async fn sorted_set_range_by_score(
        &self,
        db: Database,
        key: &str,
        min: i64,
        max: i64,
    ) -> ClientResult<Vec<String>> {
        self.query_strings(db, Command::new("ZRANGEBYSCORE").arg(key).arg(min).arg(max))
            .await
    }

    /// ZREMRANGEBYSCORE; returns the number of members removed
    pub async fn sorted_set_remove_by_score_range(
        &self,
        db: Database,
        key: &str,
        min: i64,
        max: i64,
    ) -> ClientResult<i64> {
        self.query(db, Command::new("ZREMRANGEBYSCORE").arg(key).arg(min).arg(max))
            .await
    }

    /// ZREMRANGEBYRANK; `start` and `stop` are inclusive ranks, negative
    /// ranks count from the highest score
    pub async fn sorted_set_remove_by_rank_range(
        &self,
        db: Database,
        key: &str,
        start: i64,
        stop: i64,
    ) -> ClientResult<i64> {
        self.query(db, Command::new("ZREMRANGEBYRANK").arg(key).arg(start).arg(stop))
            .await
    }
}
