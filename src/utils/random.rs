use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};

/// 进程级随机数源
///
/// 启动时构造一次并注入到抽奖服务中，测试里可以换成固定种子的实现。
pub trait RandomSource: Send + Sync {
    /// [0, 1) 之间的浮点数
    fn next_f64(&self) -> f64;

    /// [0, upper) 之间的整数，upper 必须大于 0
    fn next_below(&self, upper: usize) -> usize;
}

pub type SharedRandom = Arc<dyn RandomSource>;

/// 基于 StdRng 的实现，内部加锁，只在启动时播种一次
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// 有种子用种子，没有则取系统熵
    pub fn shared(seed: Option<u64>) -> SharedRandom {
        match seed {
            Some(s) => Arc::new(Self::from_seed(s)),
            None => Arc::new(Self::from_entropy()),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // 锁中毒时仍然可以继续使用内部状态
        let mut guard = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&self) -> f64 {
        self.with_rng(|rng| rng.r#gen::<f64>())
    }

    fn next_below(&self, upper: usize) -> usize {
        self.with_rng(|rng| rng.gen_range(0..upper))
    }
}

/// 从 [0, max) 中不重复地选出 min(count, max) 个下标
///
/// Fisher-Yates 部分洗牌：只处理末尾 k 个位置，代价 O(k)（加上建池的 O(max)）。
pub fn random_indices(rng: &dyn RandomSource, max: usize, count: usize) -> Vec<usize> {
    let count = count.min(max);
    let mut indices: Vec<usize> = (0..max).collect();

    for i in (max - count..max).rev() {
        let j = rng.next_below(i + 1);
        indices.swap(i, j);
    }

    indices.split_off(max - count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_indices_distinct_and_in_range() {
        let rng = SeededRandom::from_seed(7);
        let picked = random_indices(&rng, 10, 5);
        assert_eq!(picked.len(), 5);
        let unique: HashSet<usize> = picked.iter().copied().collect();
        assert_eq!(unique.len(), 5);
        assert!(picked.iter().all(|&i| i < 10));
    }

    #[test]
    fn test_random_indices_clamps_to_max() {
        let rng = SeededRandom::from_seed(1);
        let mut picked = random_indices(&rng, 3, 100);
        picked.sort_unstable();
        assert_eq!(picked, vec![0, 1, 2]);
    }

    #[test]
    fn test_random_indices_empty() {
        let rng = SeededRandom::from_seed(1);
        assert!(random_indices(&rng, 0, 5).is_empty());
        assert!(random_indices(&rng, 5, 0).is_empty());
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = SeededRandom::from_seed(99);
        let b = SeededRandom::from_seed(99);
        for _ in 0..20 {
            assert_eq!(a.next_below(1000), b.next_below(1000));
        }
    }

    #[test]
    fn test_next_f64_range() {
        let rng = SeededRandom::from_seed(3);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
