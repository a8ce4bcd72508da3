//! 组件创建顺序
//!
//! 只追加的有序列表，记录每个组件第一次就绪的顺序。容器销毁时逆序消费。

use chrono::{DateTime, Utc};
use di_abstractions::ComponentInstance;
use infrastructure_common::{ComponentKey, PluginId};
use parking_lot::Mutex;
use std::collections::HashSet;

/// 一条创建记录
#[derive(Debug, Clone)]
pub struct CreationRecord {
    /// 组件键
    pub key: ComponentKey,
    /// 来源插件
    pub origin: PluginId,
    /// 实例
    pub instance: ComponentInstance,
    /// 就绪时间
    pub created_at: DateTime<Utc>,
    adapter_id: u64,
}

#[derive(Debug, Default)]
struct CreationOrderInner {
    records: Vec<CreationRecord>,
    adapters: HashSet<u64>,
}

/// 创建顺序列表
///
/// 同一个适配器最多追加一次；并发追加不会丢失。
#[derive(Debug, Default)]
pub struct CreationOrder {
    inner: Mutex<CreationOrderInner>,
}

impl CreationOrder {
    /// 创建空列表
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加记录，返回是否真正追加
    pub(crate) fn record(
        &self,
        adapter_id: u64,
        key: ComponentKey,
        origin: &PluginId,
        instance: &ComponentInstance,
    ) -> bool {
        let mut inner = self.inner.lock();
        if !inner.adapters.insert(adapter_id) {
            return false;
        }
        inner.records.push(CreationRecord {
            key,
            origin: origin.clone(),
            instance: instance.clone(),
            created_at: Utc::now(),
            adapter_id,
        });
        true
    }

    /// 记录数量
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    /// 当前记录的快照
    pub fn snapshot(&self) -> Vec<CreationRecord> {
        self.inner.lock().records.clone()
    }

    /// 按创建顺序的组件键
    pub fn keys(&self) -> Vec<ComponentKey> {
        self.inner.lock().records.iter().map(|record| record.key).collect()
    }

    /// 取出全部记录并清空
    pub(crate) fn drain(&self) -> Vec<CreationRecord> {
        let mut inner = self.inner.lock();
        inner.adapters.clear();
        std::mem::take(&mut inner.records)
    }
}

impl CreationRecord {
    /// 产生该记录的适配器
    pub fn adapter_id(&self) -> u64 {
        self.adapter_id
    }
}
