//! 並列数を制限したワーカープール
//!
//! 最初の失敗以降は新しい仕事を開始せず、実行中のものだけを待ち合わせる。

use futures_util::stream::{FuturesUnordered, StreamExt};
use std::fmt::Display;
use std::future::Future;

/// ワーカープールの実行結果
#[derive(Debug)]
pub struct PoolReport<O, E> {
    /// 成功した結果（入力順）
    pub completed: Vec<O>,
    /// 最初に発生した失敗
    pub failure: Option<E>,
    /// 失敗により開始されなかった件数
    pub not_started: usize,
}

impl<O, E> PoolReport<O, E> {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn into_result(self) -> Result<Vec<O>, E> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.completed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    limit: usize,
}

impl WorkerPool {
    /// `limit` が 0 の場合は 1 として扱う
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// `items` の各要素に `task` を適用する
    ///
    /// 同時に実行されるのは最大 `limit` 件。失敗が起きた時点で
    /// 未着手の要素は開始しない。
    pub async fn run<'a, T, O, E, F, Fut>(&self, items: &'a [T], mut task: F) -> PoolReport<O, E>
    where
        F: FnMut(&'a T) -> Fut,
        Fut: Future<Output = Result<O, E>>,
        E: Display,
    {
        let mut pending = items.iter().enumerate();
        let mut in_flight = FuturesUnordered::new();
        let mut completed = Vec::with_capacity(items.len());
        let mut failure: Option<E> = None;

        loop {
            while failure.is_none() && in_flight.len() < self.limit {
                let Some((index, item)) = pending.next() else {
                    break;
                };
                let fut = task(item);
                in_flight.push(async move { (index, fut.await) });
            }

            match in_flight.next().await {
                Some((index, Ok(output))) => completed.push((index, output)),
                Some((_, Err(err))) => {
                    if failure.is_none() {
                        failure = Some(err);
                    } else {
                        tracing::warn!("Additional failure after fail-fast: {}", err);
                    }
                }
                None => break,
            }
        }

        completed.sort_by_key(|(index, _)| *index);

        PoolReport {
            completed: completed.into_iter().map(|(_, output)| output).collect(),
            failure,
            not_started: pending.count(),
        }
    }
}
