//! 候选选择：打乱结果池后等概率选一个，不按提供商加权。

use std::sync::Arc;

use super::{CandidateUrl, ResultPool};
use crate::random::RandomSource;

#[derive(Clone)]
pub struct Selector {
    rng: Arc<RandomSource>,
}

impl Selector {
    pub fn new(rng: Arc<RandomSource>) -> Self {
        Self { rng }
    }

    /// 空池返回 `None`。
    pub fn choose(&self, pool: ResultPool) -> Option<CandidateUrl> {
        let mut candidates = pool.into_vec();
        if candidates.is_empty() {
            return None;
        }

        self.rng.shuffle(&mut candidates);
        let chosen = self.rng.choose(&candidates).cloned();
        if let Some(url) = &chosen {
            log::info!("🎯 从 {} 个候选中选中：{}", candidates.len(), url);
        }
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn pool_of(count: usize) -> ResultPool {
        (0..count)
            .filter_map(|i| CandidateUrl::parse(&format!("https://img.example.com/{}.jpg", i)))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn empty_pool_has_no_candidate() {
        let selector = Selector::new(Arc::new(RandomSource::seeded(0)));
        assert!(selector.choose(ResultPool::new()).is_none());
    }

    #[test]
    fn single_candidate_is_always_chosen() {
        let selector = Selector::new(Arc::new(RandomSource::seeded(0)));
        for _ in 0..20 {
            let chosen = selector.choose(pool_of(1)).expect("one candidate");
            assert_eq!(chosen.as_str(), "https://img.example.com/0.jpg");
        }
    }

    #[test]
    fn every_candidate_can_be_chosen() {
        let selector = Selector::new(Arc::new(RandomSource::seeded(17)));
        let mut seen = HashSet::new();
        for _ in 0..400 {
            seen.insert(selector.choose(pool_of(7)).expect("non-empty pool"));
        }
        assert_eq!(seen.len(), 7);
    }
}
