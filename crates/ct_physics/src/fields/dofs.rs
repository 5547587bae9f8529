// crates/ct_physics/src/fields/dofs.rs

//! 全局自由度统计
//!
//! 对每个命名组，把组内各场的本进程自由度逐个做全局求和。
//! 纯报告用途，不影响求解器状态。所有进程必须以相同顺序传入相同的分组，
//! 否则集合求和会错配。

use std::collections::BTreeMap;

use ct_runtime::Collective;

use super::nodal::DofCarrier;

/// 一个命名的场分组
pub type DofGroup<'a> = (&'a str, Vec<&'a dyn DofCarrier>);

/// 统计各分组的全局自由度
///
/// 输出键与输入分组名一一对应；分组名重复时后者覆盖前者。
pub fn count_total_dofs(comm: &dyn Collective, groups: &[DofGroup<'_>]) -> BTreeMap<String, usize> {
    let mut totals = BTreeMap::new();
    for (name, fields) in groups {
        let total: usize = fields
            .iter()
            .map(|field| comm.sum_usize(field.local_dofs()))
            .sum();
        tracing::debug!("自由度统计: {} = {}", name, total);
        totals.insert((*name).to_string(), total);
    }
    totals
}
