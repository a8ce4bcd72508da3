//! 进度与取消接口
//!
//! 批量预创建组件时由调用方提供，只在组件之间检查取消信号。

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// 进度指示器
pub trait ProgressIndicator: Send + Sync {
    /// 是否已请求取消
    fn is_cancelled(&self) -> bool;

    /// 报告完成比例，取值范围 `0.0..=1.0`
    fn report_fraction(&self, fraction: f64);
}

/// 空进度指示器，永不取消
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyProgressIndicator;

impl ProgressIndicator for EmptyProgressIndicator {
    fn is_cancelled(&self) -> bool {
        false
    }

    fn report_fraction(&self, _fraction: f64) {}
}

/// 基于原子变量的进度指示器
///
/// 记录最近一次报告的比例，可以从其他线程取消。
#[derive(Debug, Default)]
pub struct AtomicProgressIndicator {
    cancelled: AtomicBool,
    fraction_bits: AtomicU64,
}

impl AtomicProgressIndicator {
    /// 创建新的进度指示器
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// 最近一次报告的比例
    pub fn fraction(&self) -> f64 {
        f64::from_bits(self.fraction_bits.load(Ordering::SeqCst))
    }
}

impl ProgressIndicator for AtomicProgressIndicator {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn report_fraction(&self, fraction: f64) {
        self.fraction_bits
            .store(fraction.clamp(0.0, 1.0).to_bits(), Ordering::SeqCst);
    }
}
