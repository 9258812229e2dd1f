//! 选奖策略（纯计算，不做 I/O）
//!
//! - 平铺等概率: 所有启用等级下有库存的奖品放在一起，等概率选一个
//! - 按概率加权: 按等级 probability 加权选等级，再在等级内等概率选奖品

use crate::error::{AppError, AppResult};
use crate::models::DrawMode;
use crate::services::stock_ledger::{LevelStock, StockSnapshot};
use crate::utils::RandomSource;

/// 选中的 (奖项等级, 奖品)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub level_id: i32,
    pub prize_id: i32,
}

/// 按抽奖方式在公司快照上选奖
pub fn select(
    mode: DrawMode,
    snapshot: &StockSnapshot,
    rng: &dyn RandomSource,
) -> AppResult<Selection> {
    match mode {
        DrawMode::Uniform => select_uniform(snapshot, rng),
        DrawMode::Weighted => select_weighted(snapshot, rng),
    }
}

/// 平铺所有有库存奖品，等概率选一个
pub fn select_uniform(snapshot: &StockSnapshot, rng: &dyn RandomSource) -> AppResult<Selection> {
    let pool = snapshot.available_prizes();
    if pool.is_empty() {
        return Err(AppError::NoPrizesAvailable);
    }

    let prize = pool[rng.next_below(pool.len())];
    Ok(Selection {
        level_id: prize.level_id,
        prize_id: prize.id,
    })
}

/// 按等级概率加权选等级，再在等级内等概率选奖品
pub fn select_weighted(snapshot: &StockSnapshot, rng: &dyn RandomSource) -> AppResult<Selection> {
    let candidates = snapshot.available_levels();
    let weights: Vec<f64> = candidates.iter().map(|l| l.level.probability).collect();

    let index = pick_weighted_index(&weights, rng).ok_or(AppError::NoPrizesAvailable)?;
    select_in_level(candidates[index], rng)
}

/// 在指定等级内等概率选一个有库存的奖品
pub fn select_in_level(level: &LevelStock, rng: &dyn RandomSource) -> AppResult<Selection> {
    let available: Vec<_> = level.available_prizes().collect();
    if available.is_empty() {
        return Err(AppError::OutOfStock);
    }

    let prize = available[rng.next_below(available.len())];
    Ok(Selection {
        level_id: level.level.id,
        prize_id: prize.id,
    })
}

/// 加权随机下标
///
/// 在 [0, 总权重) 取随机值，累加权重直到累加和超过该值。
/// 浮点累加误差导致走完仍未命中时回退到最后一个；
/// 总权重不为正时退化为等概率。负数与非有限权重按 0 处理。
pub fn pick_weighted_index(weights: &[f64], rng: &dyn RandomSource) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }

    let sanitized: Vec<f64> = weights
        .iter()
        .map(|w| if w.is_finite() && *w > 0.0 { *w } else { 0.0 })
        .collect();
    let total: f64 = sanitized.iter().sum();

    if total <= 0.0 {
        return Some(rng.next_below(sanitized.len()));
    }

    let target = rng.next_f64() * total;
    let mut acc = 0.0;
    for (i, w) in sanitized.iter().enumerate() {
        acc += w;
        if target < acc {
            return Some(i);
        }
    }

    Some(sanitized.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedRandom, level_model, prize_model};
    use crate::utils::SeededRandom;

    fn snapshot(levels: Vec<LevelStock>) -> StockSnapshot {
        StockSnapshot { levels }
    }

    fn level(id: i32, probability: f64, prizes: Vec<(i32, i32, i32)>) -> LevelStock {
        LevelStock {
            level: level_model(id, probability),
            prizes: prizes
                .into_iter()
                .map(|(pid, total, used)| prize_model(pid, id, total, used))
                .collect(),
        }
    }

    #[test]
    fn test_weighted_index_walks_cumulative_weights() {
        let weights = [0.1, 0.3, 0.6];
        assert_eq!(pick_weighted_index(&weights, &FixedRandom::new(0.05, 0)), Some(0));
        assert_eq!(pick_weighted_index(&weights, &FixedRandom::new(0.25, 0)), Some(1));
        assert_eq!(pick_weighted_index(&weights, &FixedRandom::new(0.45, 0)), Some(2));
        assert_eq!(pick_weighted_index(&weights, &FixedRandom::new(0.99, 0)), Some(2));
    }

    #[test]
    fn test_weighted_index_falls_back_to_last() {
        // 随机源返回上界（超出约定）时，累加走完仍未命中
        let rng = FixedRandom::new(1.0, 0);
        assert_eq!(pick_weighted_index(&[0.2, 0.2], &rng), Some(1));
    }

    #[test]
    fn test_weighted_index_zero_total_is_uniform() {
        let rng = FixedRandom::new(0.5, 2);
        assert_eq!(pick_weighted_index(&[0.0, 0.0, 0.0], &rng), Some(2));
        assert_eq!(pick_weighted_index(&[-1.0, f64::NAN, 0.0], &rng), Some(2));
        assert_eq!(pick_weighted_index(&[], &rng), None);
    }

    #[test]
    fn test_zero_weight_level_never_selected_when_others_positive() {
        let rng = SeededRandom::from_seed(11);
        for _ in 0..2000 {
            assert_ne!(pick_weighted_index(&[0.5, 0.0, 0.5], &rng), Some(1));
        }
    }

    #[test]
    fn test_weighted_selection_converges() {
        let rng = SeededRandom::from_seed(2024);
        let snap = snapshot(vec![
            level(1, 0.1, vec![(11, 1_000_000, 0)]),
            level(2, 0.3, vec![(21, 1_000_000, 0)]),
            level(3, 0.6, vec![(31, 1_000_000, 0)]),
        ]);

        let samples = 30_000;
        let mut counts = [0usize; 3];
        for _ in 0..samples {
            let s = select_weighted(&snap, &rng).unwrap();
            counts[(s.level_id - 1) as usize] += 1;
        }

        for (count, expected) in counts.iter().zip([0.1, 0.3, 0.6]) {
            let freq = *count as f64 / samples as f64;
            assert!(
                (freq - expected).abs() < 0.02,
                "frequency {freq} too far from {expected}"
            );
        }
    }

    #[test]
    fn test_weighted_skips_exhausted_levels() {
        let rng = SeededRandom::from_seed(5);
        let snap = snapshot(vec![
            level(1, 0.9, vec![(11, 2, 2)]),
            level(2, 0.1, vec![(21, 3, 0)]),
        ]);
        for _ in 0..200 {
            let s = select_weighted(&snap, &rng).unwrap();
            assert_eq!(s, Selection { level_id: 2, prize_id: 21 });
        }
    }

    #[test]
    fn test_uniform_only_picks_in_stock_prizes() {
        let rng = SeededRandom::from_seed(9);
        let snap = snapshot(vec![
            level(1, 0.0, vec![(11, 1, 1), (12, 4, 0)]),
            level(2, 0.0, vec![(21, 2, 2), (22, 1, 0)]),
        ]);
        for _ in 0..500 {
            let s = select_uniform(&snap, &rng).unwrap();
            assert!(matches!(s.prize_id, 12 | 22));
            assert_eq!(s.level_id, s.prize_id / 10);
        }
    }

    #[test]
    fn test_empty_snapshot_has_no_prizes() {
        let rng = SeededRandom::from_seed(1);
        let snap = snapshot(vec![level(1, 1.0, vec![(11, 1, 1)])]);
        assert!(matches!(select_uniform(&snap, &rng), Err(AppError::NoPrizesAvailable)));
        assert!(matches!(select_weighted(&snap, &rng), Err(AppError::NoPrizesAvailable)));
        assert!(matches!(
            select(DrawMode::Uniform, &StockSnapshot::default(), &rng),
            Err(AppError::NoPrizesAvailable)
        ));
    }

    #[test]
    fn test_select_in_exhausted_level() {
        let rng = SeededRandom::from_seed(1);
        let exhausted = level(1, 1.0, vec![(11, 3, 3)]);
        assert!(matches!(select_in_level(&exhausted, &rng), Err(AppError::OutOfStock)));
    }
}
