//! Дерево пространств имён.
//!
//! Каждый узел дерева владеет ровно одним модулем и словарём дочерних
//! узлов. Узлы создаются по требованию и никогда не удаляются, поэтому
//! модуль промежуточного узла (`app` для `app.ui.Button`) существует с
//! момента первого обращения и может быть заполнен позже.

use std::collections::BTreeMap;

use log::trace;

use super::module::ModuleRef;
use super::path::Path;

/// Узел дерева.
#[derive(Debug)]
pub struct NamespaceNode {
    module: ModuleRef,
    children: BTreeMap<String, NamespaceNode>,
}

impl NamespaceNode {
    fn new(path: Path) -> Self {
        Self {
            module: ModuleRef::new(path),
            children: BTreeMap::new(),
        }
    }

    pub fn module(&self) -> &ModuleRef {
        &self.module
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &NamespaceNode)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }
}

/// Дерево модулей.
#[derive(Debug)]
pub struct PathTree {
    root: NamespaceNode,
}

impl PathTree {
    pub fn new() -> Self {
        Self {
            // Модуль корня наружу не выдаётся: путь не бывает пустым
            root: NamespaceNode::new(Path::from_segments(Vec::new())),
        }
    }

    /// Пройти путь, создавая недостающие узлы.
    pub fn get_or_create(&mut self, path: &Path) -> ModuleRef {
        let segments = path.segments();
        let mut node = &mut self.root;

        for (depth, segment) in segments.iter().enumerate() {
            node = node.children.entry(segment.clone()).or_insert_with(|| {
                let prefix = Path::from_segments(segments[..=depth].to_vec());
                trace!("Creating namespace node {}", prefix);
                NamespaceNode::new(prefix)
            });
        }

        node.module.clone()
    }

    /// Пройти путь без создания узлов.
    pub fn lookup(&self, path: &Path) -> Option<ModuleRef> {
        let mut node = &self.root;

        for segment in path.segments() {
            node = node.children.get(segment)?;
        }

        Some(node.module.clone())
    }

    /// Все модули дерева в глубину, сегменты по алфавиту.
    pub fn modules(&self) -> Vec<ModuleRef> {
        let mut modules = Vec::new();
        let mut stack: Vec<&NamespaceNode> = self.root.children.values().rev().collect();

        while let Some(node) = stack.pop() {
            modules.push(node.module.clone());
            stack.extend(node.children.values().rev());
        }

        modules
    }

    /// Число узлов (без корня).
    pub fn node_count(&self) -> usize {
        self.modules().len()
    }
}

impl Default for PathTree {
    fn default() -> Self {
        Self::new()
    }
}
