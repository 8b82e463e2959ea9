//! # 随机源
//!
//! ## 设计思路
//!
//! 提供商调用顺序、查询后缀、最终候选 URL、User-Agent 四处都需要随机数。
//! 统一从一个可注入的 `RandomSource` 取值：生产环境使用系统熵初始化，
//! 测试中使用固定种子，从而可以断言确定的结果，而不只是统计分布。
//!
//! ## 实现思路
//!
//! 内部持有 `Mutex<StdRng>`，以 `Arc<RandomSource>` 在各组件间共享。
//! 锁中毒时直接取回内部状态继续使用（随机数状态不存在“半写入”问题）。

use std::sync::{Mutex, MutexGuard};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};

/// 线程安全、可设定种子的随机源。
pub struct RandomSource {
    rng: Mutex<StdRng>,
}

impl RandomSource {
    /// 使用操作系统熵初始化（生产环境）。
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// 使用固定种子初始化（测试 / 复现问题）。
    ///
    /// # 示例
    /// ```rust
    /// use clipboard_image_search::random::RandomSource;
    ///
    /// let a = RandomSource::seeded(7);
    /// let b = RandomSource::seeded(7);
    /// let items = [1, 2, 3, 4, 5];
    /// assert_eq!(a.choose(&items), b.choose(&items));
    /// ```
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// 从切片中等概率取一个元素；空切片返回 `None`。
    pub fn choose<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        let mut rng = self.lock();
        items.choose(&mut *rng)
    }

    /// 原地随机打乱。
    pub fn shuffle<T>(&self, items: &mut [T]) {
        let mut rng = self.lock();
        items.shuffle(&mut *rng);
    }

    fn lock(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}
