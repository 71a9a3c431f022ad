//! Deduplicate, rank and paginate aggregated matches / 去重、排序与分页

use std::collections::HashSet;

use super::types::SearchResult;

/// Keep the first occurrence of each id, preserving order / 按ID去重（保留首次出现）
pub fn dedup_by_id(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen = HashSet::with_capacity(results.len());
    results
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect()
}

/// Stable sort by relevance, highest first / 按相关度降序（稳定排序）
///
/// Equal relevance keeps discovery order.
pub fn rank(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
}

/// Slice `[offset, offset + limit)` and report the unsliced total / 分页
pub fn paginate(results: Vec<SearchResult>, limit: usize, offset: usize) -> (Vec<SearchResult>, usize) {
    let total = results.len();
    if offset >= total {
        return (Vec::new(), total);
    }
    let page = results.into_iter().skip(offset).take(limit).collect();
    (page, total)
}
