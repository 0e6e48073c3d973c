use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryModel {
    pub id: u64,
    pub name: String,
    pub parent: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: u64,
    pub name: String,
    pub parent: Option<u64>,
    pub children: Vec<CategoryNode>,
}

/// Tree form of the flat category rows. Each node owns its children,
/// the forest is always rebuilt as a whole from the rows.
#[derive(Debug, Clone, Default)]
pub struct CategoryForest {
    pub roots: Vec<CategoryNode>,
    /// ids of the rows whose parent does not exist, they are excluded
    /// from the forest together with their descendants
    pub orphans: Vec<u64>,
    /// every row keyed by id, each node carries its own subtree
    pub nodes: HashMap<u64, CategoryNode>,
}

impl CategoryForest {
    pub fn build(rows: &[CategoryModel]) -> Self {
        let existing = rows.iter().map(|r| r.id).collect::<HashSet<_>>();
        let mut children_of: HashMap<u64, Vec<&CategoryModel>> = HashMap::new();
        let mut roots = Vec::new();
        let mut orphans = Vec::new();
        for row in rows {
            match row.parent {
                Some(p) if existing.contains(&p) => {
                    children_of.entry(p).or_default().push(row);
                }
                Some(_p) => orphans.push(row.id),
                None => roots.push(row),
            }
        }
        let roots = roots
            .into_iter()
            .map(|r| Self::build_node(r, &children_of))
            .collect();
        let nodes = rows
            .iter()
            .map(|r| (r.id, Self::build_node(r, &children_of)))
            .collect();
        Self {
            roots,
            orphans,
            nodes,
        }
    }

    fn build_node(row: &CategoryModel, children_of: &HashMap<u64, Vec<&CategoryModel>>) -> CategoryNode {
        let children = children_of
            .get(&row.id)
            .map(|found| {
                found
                    .iter()
                    .map(|c| Self::build_node(c, children_of))
                    .collect()
            })
            .unwrap_or_default();
        CategoryNode {
            id: row.id,
            name: row.name.clone(),
            parent: row.parent,
            children,
        }
    }

    pub fn find(&self, id_: u64) -> Option<&CategoryNode> {
        CategoryNode::find_in(&self.roots, id_)
    }
} // end of impl CategoryForest

impl CategoryNode {
    /// depth-first search over the given nodes and their descendants
    pub fn find_in(nodes: &[CategoryNode], id_: u64) -> Option<&CategoryNode> {
        for node in nodes {
            if node.id == id_ {
                return Some(node);
            }
            if let Some(found) = Self::find_in(&node.children, id_) {
                return Some(found);
            }
        }
        None
    }
}

impl CategoryModel {
    /// Report whether assigning `new_parent` to the category `id_` would
    /// make the category its own ancestor. `parents` maps each existing
    /// category to its current parent.
    pub fn creates_cycle(id_: u64, new_parent: u64, parents: &HashMap<u64, Option<u64>>) -> bool {
        let mut visited = HashSet::new();
        let mut curr = Some(new_parent);
        while let Some(c) = curr {
            if c == id_ {
                return true;
            }
            if !visited.insert(c) {
                break;
            } // the chain already loops without the given category
            curr = parents.get(&c).copied().flatten();
        }
        false
    }
}
