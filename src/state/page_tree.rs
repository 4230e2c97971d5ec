use crate::api::{ApiResult, PageStore};
use crate::models::{Page, PageId, PageNode};
use crate::state::expansion::ExpansionState;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};

/// The full page forest as shown in the sidebar.
///
/// Built in one pass by [`load_page_tree`]; there is no incremental patching, so every
/// mutation that can change the tree pays a full rebuild of one remote call per page. That
/// is fine for personal workspaces and the first thing to revisit for large ones.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PageTree {
    roots: Vec<PageNode>,
}

/// One visible sidebar row.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TreeRow {
    pub page: Page,
    pub depth: usize,
    pub has_children: bool,
    pub is_expanded: bool,
}

impl PageTree {
    pub fn from_roots(roots: Vec<PageNode>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PageNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&PageNode> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    pub fn find(&self, id: &str) -> Option<&PageNode> {
        let mut stack: Vec<&PageNode> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            if node.page.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter());
        }
        None
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Ids of the ancestors of `id`, outermost first. Empty for roots and unknown ids.
    pub fn ancestors(&self, id: &str) -> Vec<PageId> {
        let mut parent_of: HashMap<&str, &str> = HashMap::new();
        let mut stack: Vec<&PageNode> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            for child in &node.children {
                parent_of.insert(child.page.id.as_str(), node.page.id.as_str());
                stack.push(child);
            }
        }

        let mut out = Vec::new();
        let mut cur = id;
        while let Some(parent) = parent_of.get(cur) {
            if out.len() > parent_of.len() {
                break;
            }
            out.push(parent.to_string());
            cur = *parent;
        }
        out.reverse();
        out
    }

    /// Every page in preorder, expanded or not.
    pub fn pages(&self) -> Vec<Page> {
        let mut out = Vec::new();
        let mut stack: Vec<&PageNode> = self.roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node.page.clone());
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Re-attaches expansion flags by page id.
    pub fn annotate(&mut self, expansion: &ExpansionState) {
        let mut stack: Vec<&mut PageNode> = self.roots.iter_mut().collect();
        while let Some(node) = stack.pop() {
            node.is_expanded = expansion.is_expanded(&node.page.id);
            stack.extend(node.children.iter_mut());
        }
    }

    /// Preorder rows, descending only into expanded nodes.
    pub fn visible_rows(&self) -> Vec<TreeRow> {
        let mut out = Vec::new();
        let mut stack: Vec<(usize, &PageNode)> = self.roots.iter().rev().map(|n| (0, n)).collect();
        while let Some((depth, node)) = stack.pop() {
            out.push(TreeRow {
                page: node.page.clone(),
                depth,
                has_children: !node.children.is_empty(),
                is_expanded: node.is_expanded,
            });
            if node.is_expanded {
                stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
            }
        }
        out
    }
}

struct ArenaNode {
    page: Page,
    children: Vec<usize>,
}

/// Fetches the root pages and then every descendant, level by level.
///
/// Children of one level are fetched concurrently. A failed child fetch is logged and
/// leaves that branch empty; only a failed root fetch fails the whole load. Archived pages
/// are skipped, and a page that shows up twice (a malformed parent chain) is kept only at
/// its first position.
pub(crate) async fn load_page_tree<S: PageStore>(
    store: &S,
    expansion: &ExpansionState,
) -> ApiResult<PageTree> {
    let roots = store.fetch_root_pages().await?;

    let mut arena: Vec<ArenaNode> = Vec::new();
    let mut seen: HashSet<PageId> = HashSet::new();
    let mut root_ix: Vec<usize> = Vec::new();

    for page in roots {
        if page.is_archived || !seen.insert(page.id.clone()) {
            continue;
        }
        root_ix.push(arena.len());
        arena.push(ArenaNode {
            page,
            children: vec![],
        });
    }

    let mut frontier = root_ix.clone();
    while !frontier.is_empty() {
        let batch: Vec<(usize, PageId)> = frontier
            .iter()
            .map(|&ix| (ix, arena[ix].page.id.clone()))
            .collect();

        let results = join_all(batch.into_iter().map(|(ix, id)| async move {
            let res = store.fetch_children(&id).await;
            (ix, id, res)
        }))
        .await;

        let mut next = Vec::new();
        for (ix, parent_id, res) in results {
            let children = match res {
                Ok(children) => children,
                Err(e) => {
                    tracing::warn!(page_id = %parent_id, error = %e, "failed to load child pages");
                    continue;
                }
            };

            for child in children {
                if child.is_archived {
                    continue;
                }
                if !seen.insert(child.id.clone()) {
                    tracing::warn!(
                        page_id = %child.id,
                        parent_id = %parent_id,
                        "page already in tree, skipping"
                    );
                    continue;
                }
                let child_ix = arena.len();
                arena.push(ArenaNode {
                    page: child,
                    children: vec![],
                });
                arena[ix].children.push(child_ix);
                next.push(child_ix);
            }
        }
        frontier = next;
    }

    // Children are always pushed after their parent, so building back to front sees every
    // child before the node that owns it.
    let mut built: Vec<Option<PageNode>> = Vec::with_capacity(arena.len());
    built.resize_with(arena.len(), || None);
    for (ix, node) in arena.into_iter().enumerate().rev() {
        let children = node
            .children
            .iter()
            .filter_map(|&c| built[c].take())
            .collect();
        let is_expanded = expansion.is_expanded(&node.page.id);
        built[ix] = Some(PageNode {
            page: node.page,
            children,
            is_expanded,
        });
    }

    let roots = root_ix.iter().filter_map(|&ix| built[ix].take()).collect();
    Ok(PageTree::from_roots(roots))
}
