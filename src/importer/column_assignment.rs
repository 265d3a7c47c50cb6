// ==========================================
// CSV 导入向导 - 列分配状态
// ==========================================
// 职责: 字段名 → 列序号 映射
// 不变式: 任一列最多归属一个字段（分配时覆盖旧归属）
// ==========================================

use crate::domain::types::FieldList;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAssignmentMap {
    entries: HashMap<String, usize>,
}

impl FieldAssignmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 把字段分配到列
    ///
    /// # 返回
    /// - Some(name): 该列原先归属的其他字段（已被移除）
    /// - None: 该列原先空闲或本就属于该字段
    pub fn assign(&mut self, field: impl Into<String>, column: usize) -> Option<String> {
        let field = field.into();

        let evicted = self
            .entries
            .iter()
            .find(|(name, idx)| **idx == column && **name != field)
            .map(|(name, _)| name.clone());

        if let Some(ref name) = evicted {
            self.entries.remove(name);
        }

        self.entries.insert(field, column);
        evicted
    }

    /// 清除列上的分配，列空闲时不做任何事
    pub fn unassign(&mut self, column: usize) -> Option<String> {
        let owner = self.field_for_column(column)?.to_string();
        self.entries.remove(&owner);
        Some(owner)
    }

    /// 清除字段的分配
    pub fn unassign_field(&mut self, field: &str) -> Option<usize> {
        self.entries.remove(field)
    }

    pub fn column_of(&self, field: &str) -> Option<usize> {
        self.entries.get(field).copied()
    }

    pub fn field_for_column(&self, column: usize) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, idx)| **idx == column)
            .map(|(name, _)| name.as_str())
    }

    pub fn is_column_assigned(&self, column: usize) -> bool {
        self.entries.values().any(|idx| *idx == column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(name, idx)| (name.as_str(), *idx))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 尚未分配的必填字段（按字段列表顺序）
    pub fn missing_required<'a>(&self, fields: &'a FieldList) -> Vec<&'a str> {
        fields
            .required_names()
            .filter(|name| !self.entries.contains_key(*name))
            .collect()
    }

    /// 所有必填字段均已分配
    pub fn is_ready(&self, fields: &FieldList) -> bool {
        self.missing_required(fields).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::FieldDescriptor;
    use std::collections::HashSet;

    fn fields() -> FieldList {
        FieldList::from(vec![
            FieldDescriptor::required("f1", "Field 1"),
            FieldDescriptor::optional("f2", "Field 2"),
        ])
    }

    fn assert_unique_columns(map: &FieldAssignmentMap) {
        let mut seen = HashSet::new();
        for (_, idx) in map.iter() {
            assert!(seen.insert(idx), "column {} owned twice", idx);
        }
    }

    #[test]
    fn test_assign_evicts_previous_owner() {
        let mut map = FieldAssignmentMap::new();
        assert_eq!(map.assign("f1", 0), None);
        assert_eq!(map.assign("f2", 0), Some("f1".to_string()));

        assert_eq!(map.column_of("f1"), None);
        assert_eq!(map.column_of("f2"), Some(0));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_reassign_same_field_moves_it() {
        let mut map = FieldAssignmentMap::new();
        map.assign("f1", 0);
        assert_eq!(map.assign("f1", 3), None);

        assert_eq!(map.column_of("f1"), Some(3));
        assert!(!map.is_column_assigned(0));
    }

    #[test]
    fn test_unassign_round_trip() {
        let mut map = FieldAssignmentMap::new();
        map.assign("f1", 2);
        assert_eq!(map.unassign(2), Some("f1".to_string()));
        assert_eq!(map.column_of("f1"), None);

        map.assign("f1", 4);
        assert_eq!(map.iter().filter(|(name, _)| *name == "f1").count(), 1);
    }

    #[test]
    fn test_unassign_free_column_is_noop() {
        let mut map = FieldAssignmentMap::new();
        map.assign("f1", 1);
        let before = map.clone();

        assert_eq!(map.unassign(7), None);
        assert_eq!(map, before);
    }

    #[test]
    fn test_column_uniqueness_over_mixed_sequence() {
        let mut map = FieldAssignmentMap::new();
        let names = ["a", "b", "c", "d"];

        // 线性同余序列，覆盖 assign/unassign 交错
        let mut seed: u32 = 17;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let column = ((seed >> 8) % 5) as usize;
            let name = names[((seed >> 16) % 4) as usize];
            if seed % 3 == 0 {
                map.unassign(column);
            } else {
                map.assign(name, column);
            }
            assert_unique_columns(&map);
        }
    }

    #[test]
    fn test_ready_predicate_ignores_optional() {
        let fields = fields();
        let mut map = FieldAssignmentMap::new();
        assert!(!map.is_ready(&fields));
        assert_eq!(map.missing_required(&fields), vec!["f1"]);

        map.assign("f2", 0);
        assert!(!map.is_ready(&fields));

        map.assign("f1", 1);
        assert!(map.is_ready(&fields));

        map.unassign_field("f2");
        assert!(map.is_ready(&fields));
    }
}
