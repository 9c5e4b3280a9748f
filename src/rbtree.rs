//! Red-black tree set with caller-supplied ordering.
//!
//! Nodes live in an arena and link to each other through indices; `NIL`
//! stands in for an absent child or parent and counts as black. The ordering
//! is passed to every operation instead of being stored, so it may borrow
//! state the caller mutates between calls. Comparators are fallible: a
//! comparison error aborts the operation and is handed back unchanged.

use std::cmp::Ordering;

type NodeIdx = usize;

const NIL: NodeIdx = NodeIdx::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Clone, Debug)]
struct Node<K> {
    color: Color,
    left: NodeIdx,
    right: NodeIdx,
    parent: NodeIdx,
    key: K,
}

#[derive(Clone, Debug)]
pub struct RbTreeSet<K> {
    nodes: Vec<Node<K>>,
    free: Vec<NodeIdx>,
    root: NodeIdx,
    len: usize,
}

impl<K> Default for RbTreeSet<K> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NIL,
            len: 0,
        }
    }
}

impl<K: Copy> RbTreeSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = NIL;
        self.len = 0;
    }

    /// Keys in ascending order.
    pub fn iter(&self) -> Iter<'_, K> {
        let mut next = self.root;
        if next != NIL {
            while self.left(next) != NIL {
                next = self.left(next);
            }
        }
        Iter { set: self, next }
    }

    /// Inserts `key`. Returns `false` if an equal key is already present.
    pub fn insert<E, F>(&mut self, key: K, cmp: F) -> Result<bool, E>
    where
        F: Fn(&K, &K) -> Result<Ordering, E>,
    {
        let mut parent = NIL;
        let mut went_left = false;
        let mut n = self.root;
        while n != NIL {
            parent = n;
            match cmp(&key, &self.nodes[n].key)? {
                Ordering::Equal => return Ok(false),
                Ordering::Less => {
                    went_left = true;
                    n = self.left(n);
                }
                Ordering::Greater => {
                    went_left = false;
                    n = self.right(n);
                }
            }
        }

        let x = self.alloc(key, parent);
        if parent == NIL {
            self.root = x;
        } else if went_left {
            self.nodes[parent].left = x;
        } else {
            self.nodes[parent].right = x;
        }
        self.len += 1;
        self.insert_fixup(x);
        Ok(true)
    }

    /// Removes the key equal to `key`. Returns `false` if there is none.
    pub fn remove<E, F>(&mut self, key: &K, cmp: F) -> Result<bool, E>
    where
        F: Fn(&K, &K) -> Result<Ordering, E>,
    {
        let x = self.find(key, cmp)?;
        if x == NIL {
            return Ok(false);
        }
        self.remove_node(x);
        Ok(true)
    }

    pub fn contains<E, F>(&self, key: &K, cmp: F) -> Result<bool, E>
    where
        F: Fn(&K, &K) -> Result<Ordering, E>,
    {
        Ok(self.find(key, cmp)? != NIL)
    }

    /// Largest key that `locate` does not place above the searched element.
    ///
    /// `locate(k)` orders the searched element against the stored key `k`, so
    /// the element may be of a different type than the keys (a point looked
    /// up among edges). A key `locate` reports as equal is returned as is.
    pub fn find_left_neighbour<F>(&self, locate: F) -> Option<K>
    where
        F: Fn(&K) -> Ordering,
    {
        let mut result = None;
        let mut n = self.root;
        while n != NIL {
            let key = self.nodes[n].key;
            match locate(&key) {
                Ordering::Equal => return Some(key),
                Ordering::Less => n = self.left(n),
                Ordering::Greater => {
                    result = Some(key);
                    n = self.right(n);
                }
            }
        }
        result
    }

    fn find<E, F>(&self, key: &K, cmp: F) -> Result<NodeIdx, E>
    where
        F: Fn(&K, &K) -> Result<Ordering, E>,
    {
        let mut n = self.root;
        while n != NIL {
            match cmp(key, &self.nodes[n].key)? {
                Ordering::Equal => return Ok(n),
                Ordering::Less => n = self.left(n),
                Ordering::Greater => n = self.right(n),
            }
        }
        Ok(NIL)
    }

    fn alloc(&mut self, key: K, parent: NodeIdx) -> NodeIdx {
        let node = Node {
            color: Color::Red,
            left: NIL,
            right: NIL,
            parent,
            key,
        };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    #[inline]
    fn left(&self, n: NodeIdx) -> NodeIdx {
        self.nodes[n].left
    }

    #[inline]
    fn right(&self, n: NodeIdx) -> NodeIdx {
        self.nodes[n].right
    }

    #[inline]
    fn parent(&self, n: NodeIdx) -> NodeIdx {
        self.nodes[n].parent
    }

    #[inline]
    fn color(&self, n: NodeIdx) -> Color {
        if n == NIL {
            Color::Black
        } else {
            self.nodes[n].color
        }
    }

    #[inline]
    fn set_color(&mut self, n: NodeIdx, color: Color) {
        self.nodes[n].color = color;
    }

    fn sibling(&self, x: NodeIdx, p: NodeIdx) -> NodeIdx {
        if x == self.left(p) {
            self.right(p)
        } else {
            self.left(p)
        }
    }

    fn predecessor(&self, mut x: NodeIdx) -> NodeIdx {
        if self.left(x) != NIL {
            x = self.left(x);
            while self.right(x) != NIL {
                x = self.right(x);
            }
            return x;
        }
        let mut p = self.parent(x);
        while p != NIL && x == self.left(p) {
            x = p;
            p = self.parent(x);
        }
        p
    }

    fn successor(&self, mut x: NodeIdx) -> NodeIdx {
        if self.right(x) != NIL {
            x = self.right(x);
            while self.left(x) != NIL {
                x = self.left(x);
            }
            return x;
        }
        let mut p = self.parent(x);
        while p != NIL && x == self.right(p) {
            x = p;
            p = self.parent(x);
        }
        p
    }

    /// Points the link that referenced `x` (a child slot or the root) at `y`.
    fn replace_child(&mut self, x: NodeIdx, y: NodeIdx) {
        let p = self.parent(x);
        if p == NIL {
            self.root = y;
        } else if x == self.left(p) {
            self.nodes[p].left = y;
        } else {
            self.nodes[p].right = y;
        }
    }

    //   x            y
    //  / \          / \
    // A   y   ->   x   C
    //    / \      / \
    //   B   C    A   B
    fn rotate_left(&mut self, x: NodeIdx) {
        let y = self.right(x);
        let b = self.left(y);
        self.nodes[x].right = b;
        if b != NIL {
            self.nodes[b].parent = x;
        }
        self.nodes[y].parent = self.parent(x);
        self.replace_child(x, y);
        self.nodes[y].left = x;
        self.nodes[x].parent = y;
    }

    //     x          y
    //    / \        / \
    //   y   C  ->  A   x
    //  / \            / \
    // A   B          B   C
    fn rotate_right(&mut self, x: NodeIdx) {
        let y = self.left(x);
        let b = self.right(y);
        self.nodes[x].left = b;
        if b != NIL {
            self.nodes[b].parent = x;
        }
        self.nodes[y].parent = self.parent(x);
        self.replace_child(x, y);
        self.nodes[y].right = x;
        self.nodes[x].parent = y;
    }

    /// Restores the red-black properties after `x` was linked in red.
    fn insert_fixup(&mut self, mut x: NodeIdx) {
        // case 1: x is the root
        while self.parent(x) != NIL {
            let p = self.parent(x);
            // case 2: parent is black
            if self.color(p) == Color::Black {
                return;
            }

            // a red parent is never the root
            let g = self.parent(p);
            let u = self.sibling(p, g);

            // case 3: red uncle, push the violation up
            if self.color(u) == Color::Red {
                self.set_color(p, Color::Black);
                self.set_color(u, Color::Black);
                self.set_color(g, Color::Red);
                x = g;
                continue;
            }

            // case 4: bring x to the outside of its grandparent
            if x == self.right(p) && p == self.left(g) {
                self.rotate_left(p);
                x = self.left(x);
            } else if x == self.left(p) && p == self.right(g) {
                self.rotate_right(p);
                x = self.right(x);
            }

            // case 5: red parent, black uncle, black grandparent
            let p = self.parent(x);
            let g = self.parent(p);
            self.set_color(p, Color::Black);
            self.set_color(g, Color::Red);
            if x == self.left(p) && p == self.left(g) {
                self.rotate_right(g);
            } else {
                self.rotate_left(g);
            }
            return;
        }
        self.set_color(x, Color::Black);
    }

    fn remove_node(&mut self, mut x: NodeIdx) {
        self.len -= 1;

        // with two children, move the predecessor's key up and unlink the
        // predecessor instead; order and colors are unaffected
        if self.left(x) != NIL && self.right(x) != NIL {
            let y = self.predecessor(x);
            self.nodes[x].key = self.nodes[y].key;
            x = y;
        }

        let child = if self.left(x) != NIL {
            self.left(x)
        } else {
            self.right(x)
        };
        let p = self.parent(x);
        if child != NIL {
            self.nodes[child].parent = p;
        }
        self.replace_child(x, child);

        let removed = self.color(x);
        self.free.push(x);
        if removed == Color::Red {
            return;
        }
        if self.color(child) == Color::Red {
            self.set_color(child, Color::Black);
            return;
        }
        self.remove_fixup(child, p);
    }

    /// `x` (possibly `NIL`) is one black short; `p` is its parent.
    fn remove_fixup(&mut self, mut x: NodeIdx, mut p: NodeIdx) {
        // case 1: x is the root
        while p != NIL {
            let mut s = self.sibling(x, p);

            // case 2: red sibling, rotate it above p
            if self.color(s) == Color::Red {
                self.set_color(p, Color::Red);
                self.set_color(s, Color::Black);
                if x == self.left(p) {
                    self.rotate_left(p);
                } else {
                    self.rotate_right(p);
                }
                s = self.sibling(x, p);
            }

            let s_children_black =
                self.color(self.left(s)) == Color::Black && self.color(self.right(s)) == Color::Black;

            // case 3: p, s and both of s's children black, push the deficit up
            if self.color(p) == Color::Black && self.color(s) == Color::Black && s_children_black {
                self.set_color(s, Color::Red);
                x = p;
                p = self.parent(x);
                continue;
            }

            // case 4: red p, black s with black children
            if self.color(p) == Color::Red && self.color(s) == Color::Black && s_children_black {
                self.set_color(s, Color::Red);
                self.set_color(p, Color::Black);
                return;
            }

            // case 5: turn an inner red nephew into an outer one
            if x == self.left(p)
                && self.color(s) == Color::Black
                && self.color(self.left(s)) == Color::Red
                && self.color(self.right(s)) == Color::Black
            {
                self.set_color(s, Color::Red);
                let sl = self.left(s);
                self.set_color(sl, Color::Black);
                self.rotate_right(s);
            } else if x == self.right(p)
                && self.color(s) == Color::Black
                && self.color(self.right(s)) == Color::Red
                && self.color(self.left(s)) == Color::Black
            {
                self.set_color(s, Color::Red);
                let sr = self.right(s);
                self.set_color(sr, Color::Black);
                self.rotate_left(s);
            }

            // case 6: outer nephew is red, rotate s above p
            let s = self.sibling(x, p);
            let p_color = self.color(p);
            self.set_color(s, p_color);
            self.set_color(p, Color::Black);
            if x == self.left(p) {
                let sr = self.right(s);
                self.set_color(sr, Color::Black);
                self.rotate_left(p);
            } else {
                let sl = self.left(s);
                self.set_color(sl, Color::Black);
                self.rotate_right(p);
            }
            return;
        }
    }

    /// Checks the red-black invariants and returns the black height.
    #[cfg(test)]
    fn verify(&self) -> usize {
        fn walk<K: Copy>(set: &RbTreeSet<K>, n: NodeIdx) -> usize {
            if n == NIL {
                return 1;
            }
            let node = &set.nodes[n];
            if node.color == Color::Red {
                assert_eq!(set.color(node.left), Color::Black, "red node with red child");
                assert_eq!(set.color(node.right), Color::Black, "red node with red child");
            }
            for child in [node.left, node.right] {
                if child != NIL {
                    assert_eq!(set.nodes[child].parent, n, "broken parent link");
                }
            }
            let left = walk(set, node.left);
            let right = walk(set, node.right);
            assert_eq!(left, right, "unequal black height");
            left + usize::from(node.color == Color::Black)
        }

        assert_eq!(self.color(self.root), Color::Black, "red root");
        if self.root != NIL {
            assert_eq!(self.parent(self.root), NIL);
        }
        walk(self, self.root)
    }
}

pub struct Iter<'a, K> {
    set: &'a RbTreeSet<K>,
    next: NodeIdx,
}

impl<K: Copy> Iterator for Iter<'_, K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        if self.next == NIL {
            return None;
        }
        let current = self.next;
        self.next = self.set.successor(current);
        Some(self.set.nodes[current].key)
    }
}
