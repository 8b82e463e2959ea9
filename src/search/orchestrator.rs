//! # 提供商编排
//!
//! ## 设计思路
//!
//! 每次调用独立地随机打乱提供商顺序，避免长期偏向或冷落某个后端，同时分散请求压力。
//! 严格串行调用；结果池达到早停阈值后，剩余提供商直接跳过（不调用）。
//! 全部调用后仍为空是正常终点，返回空池。
//!
//! ## 实现思路
//!
//! 对 `ImageSearchProvider` 泛型，生产环境使用 `ProviderAdapter`，
//! 测试使用脚本化提供商，配合固定种子的 `RandomSource` 断言调用顺序与次数。

use std::sync::Arc;
use std::time::Instant;

use super::{ImageSearchProvider, ProviderAdapter, ResultPool};
use crate::query::EnhancedQuery;
use crate::random::RandomSource;

pub struct ProviderOrchestrator<P = ProviderAdapter> {
    providers: Vec<P>,
    early_stop_threshold: usize,
    rng: Arc<RandomSource>,
}

impl<P: ImageSearchProvider> ProviderOrchestrator<P> {
    pub fn new(providers: Vec<P>, early_stop_threshold: usize, rng: Arc<RandomSource>) -> Self {
        Self {
            providers,
            early_stop_threshold: early_stop_threshold.max(1),
            rng,
        }
    }

    pub fn providers(&self) -> &[P] {
        &self.providers
    }

    /// 随机顺序依次调用提供商并累积结果，达到阈值即停止。
    pub async fn resolve(&self, query: &EnhancedQuery) -> ResultPool {
        let started = Instant::now();
        let mut order: Vec<&P> = self.providers.iter().collect();
        self.rng.shuffle(&mut order);

        log::debug!(
            "🎲 本次提供商顺序：{}",
            order.iter().map(|p| p.name()).collect::<Vec<_>>().join(" → ")
        );

        let mut pool = ResultPool::new();
        let mut invoked = 0usize;

        for provider in order {
            invoked += 1;
            let batch = provider.search(query).await;
            if batch.is_empty() {
                continue;
            }

            pool.extend(batch);
            if pool.len() >= self.early_stop_threshold {
                log::info!(
                    "⏹️ 结果池已有 {} 个候选（阈值 {}），跳过剩余 {} 个提供商",
                    pool.len(),
                    self.early_stop_threshold,
                    self.providers.len() - invoked
                );
                break;
            }
        }

        if pool.is_empty() {
            log::warn!("🈳 所有提供商均未找到图片");
        } else {
            log::info!(
                "✅ 搜索完成 - 调用 {} 个提供商，共 {} 个候选，耗时 {}ms",
                invoked,
                pool.len(),
                started.elapsed().as_millis()
            );
        }

        pool
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::query::Query;
    use crate::search::{CandidateUrl, ProviderResult};
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// 返回固定数量结果，并记录调用顺序的假提供商。
    pub(crate) struct ScriptedProvider {
        pub(crate) name: &'static str,
        pub(crate) count: usize,
        pub(crate) calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ScriptedProvider {
        pub(crate) fn new(name: &'static str, count: usize, calls: Arc<Mutex<Vec<&'static str>>>) -> Self {
            Self { name, count, calls }
        }
    }

    impl ImageSearchProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search(&self, _query: &EnhancedQuery) -> ProviderResult {
            self.calls.lock().expect("calls lock").push(self.name);
            (0..self.count)
                .filter_map(|i| {
                    CandidateUrl::parse(&format!("https://{}.example.com/{}.jpg", self.name, i))
                })
                .collect()
        }
    }

    fn query() -> EnhancedQuery {
        EnhancedQuery::new(&Query::parse("harbor seal").expect("query"), " HD")
    }

    fn orchestrator(
        counts: &[(&'static str, usize)],
        seed: u64,
    ) -> (ProviderOrchestrator<ScriptedProvider>, Arc<Mutex<Vec<&'static str>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let providers = counts
            .iter()
            .map(|&(name, count)| ScriptedProvider::new(name, count, Arc::clone(&calls)))
            .collect();
        (
            ProviderOrchestrator::new(providers, 5, Arc::new(RandomSource::seeded(seed))),
            calls,
        )
    }

    #[tokio::test]
    async fn pool_size_is_sum_up_to_first_provider_reaching_threshold() {
        let counts = [("empty", 0usize), ("three", 3), ("four", 4)];

        for seed in 0..32 {
            let (orchestrator, calls) = orchestrator(&counts, seed);
            let pool = orchestrator.resolve(&query()).await;
            let calls = calls.lock().expect("calls lock").clone();

            let mut expected = 0usize;
            let mut expected_calls = 0usize;
            for name in &calls {
                expected_calls += 1;
                expected += counts.iter().find(|(n, _)| n == name).map(|(_, c)| *c).unwrap_or(0);
                if expected >= 5 {
                    break;
                }
            }

            assert_eq!(pool.len(), expected, "seed {seed}: order {calls:?}");
            assert_eq!(calls.len(), expected_calls, "seed {seed}: extra provider invoked");
            assert_eq!(pool.len(), 7, "3 + 4 always needed to reach 5");

            let unique: HashSet<_> = calls.iter().collect();
            assert_eq!(unique.len(), calls.len(), "provider invoked twice");
        }
    }

    #[tokio::test]
    async fn first_provider_reaching_threshold_stops_the_fan_out() {
        let (orchestrator, calls) = orchestrator(&[("a", 6), ("b", 6), ("c", 6)], 7);

        let pool = orchestrator.resolve(&query()).await;

        assert_eq!(pool.len(), 6);
        assert_eq!(calls.lock().expect("calls lock").len(), 1);
    }

    #[tokio::test]
    async fn all_empty_providers_yield_empty_pool_after_each_called_once() {
        let (orchestrator, calls) = orchestrator(&[("a", 0), ("b", 0), ("c", 0)], 3);

        let pool = orchestrator.resolve(&query()).await;

        assert!(pool.is_empty());
        let mut calls = calls.lock().expect("calls lock").clone();
        calls.sort_unstable();
        assert_eq!(calls, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn invocation_order_is_randomized_per_call() {
        let (orchestrator, calls) = orchestrator(&[("a", 9), ("b", 9), ("c", 9)], 99);
        let mut first_called = HashSet::new();

        for _ in 0..48 {
            calls.lock().expect("calls lock").clear();
            orchestrator.resolve(&query()).await;
            first_called.insert(calls.lock().expect("calls lock")[0]);
        }

        assert_eq!(first_called.len(), 3);
    }

    #[tokio::test]
    async fn same_seed_gives_same_order() {
        let counts = [("a", 1), ("b", 1), ("c", 1)];
        let (left, left_calls) = orchestrator(&counts, 1234);
        let (right, right_calls) = orchestrator(&counts, 1234);

        left.resolve(&query()).await;
        right.resolve(&query()).await;

        assert_eq!(
            *left_calls.lock().expect("calls lock"),
            *right_calls.lock().expect("calls lock")
        );
    }
}
