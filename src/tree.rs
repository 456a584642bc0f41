//! A self-balancing (AVL) binary search tree that indexes transactions by date.
//!
//! The tree is a secondary, in-memory index. It supports insertion and range lookups only; there
//! is no removal. When the transaction list shrinks, the owner rebuilds the tree from scratch with
//! [`TransactionTree::from_transactions`].
//!
//! # Key ordering
//!
//! Nodes are keyed by the transaction's raw `DD/MM/YYYY` date string and compared
//! lexicographically. This is *not* calendar order: `"01/12/2024"` sorts before `"15/01/2024"`
//! even though January comes first. Range queries use the same string comparison, so a range
//! covers every stored key between the two bound strings.

use crate::model::{Transaction, DATE_FORMAT};
use chrono::NaiveDate;
use std::cmp::max;
use std::sync::Arc;
use tracing::warn;

type Link = Option<Box<Node>>;

#[derive(Debug, Clone)]
struct Node {
    transaction: Arc<Transaction>,
    left: Link,
    right: Link,
    /// Height of the subtree rooted here; a leaf has height 1.
    height: usize,
    /// Number of nodes in the subtree rooted here.
    size: usize,
}

impl Node {
    fn new(transaction: Arc<Transaction>) -> Box<Self> {
        Box::new(Self {
            transaction,
            left: None,
            right: None,
            height: 1,
            size: 1,
        })
    }

    fn key(&self) -> &str {
        self.transaction.date()
    }

    fn update(&mut self) {
        self.height = max(height(&self.left), height(&self.right)) + 1;
        self.size = size(&self.left) + size(&self.right) + 1;
    }

    /// Left subtree height minus right subtree height.
    fn balance(&self) -> isize {
        height(&self.left) as isize - height(&self.right) as isize
    }
}

fn height(link: &Link) -> usize {
    link.as_ref().map_or(0, |n| n.height)
}

fn size(link: &Link) -> usize {
    link.as_ref().map_or(0, |n| n.size)
}

fn rotate_right(mut y: Box<Node>) -> Box<Node> {
    let Some(mut x) = y.left.take() else {
        return y;
    };
    y.left = x.right.take();
    y.update();
    x.right = Some(y);
    x.update();
    x
}

fn rotate_left(mut x: Box<Node>) -> Box<Node> {
    let Some(mut y) = x.right.take() else {
        return x;
    };
    x.right = y.left.take();
    x.update();
    y.left = Some(x);
    y.update();
    y
}

/// Restores the AVL invariant at `node`, assuming both subtrees already satisfy it.
fn rebalance(mut node: Box<Node>) -> Box<Node> {
    node.update();
    let balance = node.balance();
    if balance > 1 {
        // Left-right: straighten the left child first
        if node.left.as_ref().is_some_and(|l| l.balance() < 0) {
            node.left = node.left.take().map(rotate_left);
        }
        // Left-left
        return rotate_right(node);
    }
    if balance < -1 {
        // Right-left: straighten the right child first
        if node.right.as_ref().is_some_and(|r| r.balance() > 0) {
            node.right = node.right.take().map(rotate_right);
        }
        // Right-right
        return rotate_left(node);
    }
    node
}

fn insert(link: Link, transaction: Arc<Transaction>) -> Box<Node> {
    let Some(mut node) = link else {
        return Node::new(transaction);
    };
    // Equal keys go right so that equal dates keep their insertion order
    if transaction.date() < node.key() {
        node.left = Some(insert(node.left.take(), transaction));
    } else {
        node.right = Some(insert(node.right.take(), transaction));
    }
    rebalance(node)
}

fn collect_range(link: &Link, start: &str, end: &str, out: &mut Vec<Arc<Transaction>>) {
    let Some(node) = link else {
        return;
    };
    let key = node.key();
    // Only descend where keys inside [start, end] can live
    if key >= start {
        collect_range(&node.left, start, end, out);
    }
    if key >= start && key <= end {
        out.push(Arc::clone(&node.transaction));
    }
    if key <= end {
        collect_range(&node.right, start, end, out);
    }
}

fn collect_all(link: &Link, out: &mut Vec<Arc<Transaction>>) {
    if let Some(node) = link {
        collect_all(&node.left, out);
        out.push(Arc::clone(&node.transaction));
        collect_all(&node.right, out);
    }
}

/// Ordered index of transactions by date string. See the module docs for the ordering caveat.
#[derive(Debug, Clone, Default)]
pub struct TransactionTree {
    root: Link,
}

impl TransactionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree by inserting every transaction in iteration order.
    pub fn from_transactions<I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = Arc<Transaction>>,
    {
        let mut tree = Self::new();
        for transaction in transactions {
            tree.insert(transaction);
        }
        tree
    }

    /// Inserts `transaction`, rebalancing on the way back up. O(log n).
    pub fn insert(&mut self, transaction: Arc<Transaction>) {
        self.root = Some(insert(self.root.take(), transaction));
    }

    /// Returns every transaction whose date string `d` satisfies `start <= d <= end`, in key
    /// order.
    ///
    /// Both bounds must be valid `DD/MM/YYYY` dates. A malformed bound is logged and yields an
    /// empty result rather than an error.
    pub fn find_range(&self, start: &str, end: &str) -> Vec<Arc<Transaction>> {
        for bound in [start, end] {
            if let Err(e) = NaiveDate::parse_from_str(bound, DATE_FORMAT) {
                warn!("Ignoring date range lookup with malformed bound '{bound}': {e}");
                return Vec::new();
            }
        }
        let mut out = Vec::new();
        if start <= end {
            collect_range(&self.root, start, end, &mut out);
        }
        out
    }

    /// All transactions in key order.
    pub fn to_list(&self) -> Vec<Arc<Transaction>> {
        let mut out = Vec::with_capacity(self.len());
        collect_all(&self.root, &mut out);
        out
    }

    pub fn len(&self) -> usize {
        size(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the tree; zero when empty.
    pub fn height(&self) -> usize {
        height(&self.root)
    }
}
