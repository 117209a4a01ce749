use crate::fs::tree::{Child, DirectoryTree, NodeId};

impl DirectoryTree {
    /// Replace the children of a freshly loaded node with its first page.
    pub(crate) fn first_page(&mut self, id: NodeId, page_size: usize) {
        let page_size = page_size.max(1);
        let Some(node) = self.get_mut(id) else {
            return;
        };
        let end = node.directories.len().min(page_size);
        node.children = node.directories[..end]
            .iter()
            .copied()
            .map(Child::Node)
            .collect();
        if end < node.directories.len() {
            node.children.push(Child::More);
        }
    }

    /// Replace the trailing More sentinel with the next page of directories.
    ///
    /// Returns false, leaving the node untouched, when there is no sentinel.
    pub fn load_more(&mut self, id: NodeId, page_size: usize) -> bool {
        let page_size = page_size.max(1);
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        if !node.has_more() {
            return false;
        }
        node.children.pop();
        let start = node.children.len();
        let end = node.directories.len().min(start + page_size);
        let page: Vec<Child> = node.directories[start..end]
            .iter()
            .copied()
            .map(Child::Node)
            .collect();
        node.children.extend(page);
        if end < node.directories.len() {
            node.children.push(Child::More);
        }
        tracing::debug!(
            "Paged {}: {} of {} directories shown",
            node.path.display(),
            end,
            node.directories.len()
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::fs::listing::list_directory;
    use crate::fs::tree::{Child, DirectoryTree, NodeId};
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn setup_test_dir(subdirs: usize) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("etc")).unwrap();
        fs::create_dir(dir.path().join("home")).unwrap();
        File::create(dir.path().join("file.txt")).unwrap();
        for i in 1..=subdirs {
            fs::create_dir(dir.path().join("home").join(format!("sub{}", i))).unwrap();
        }
        dir
    }

    async fn loaded_home(dir: &TempDir, page_size: usize) -> (DirectoryTree, NodeId) {
        let mut tree = DirectoryTree::seed_root(dir.path()).await;
        let home = tree.find_by_path(&dir.path().join("home")).unwrap();
        let path = tree.begin_load(home).unwrap();
        let listing = list_directory(&path).await;
        tree.apply_listing(&path, listing, page_size);
        (tree, home)
    }

    fn names(tree: &DirectoryTree, children: &[Child]) -> Vec<String> {
        children
            .iter()
            .map(|c| match c {
                Child::Node(id) => tree.get(*id).unwrap().name.clone(),
                Child::More => "more".to_string(),
                Child::Loading => "loading".to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn root_is_not_paged() {
        let dir = setup_test_dir(0);
        let tree = DirectoryTree::seed_root(dir.path()).await;
        assert_eq!(names(&tree, &tree.root().children), vec!["etc", "home"]);
        assert_eq!(tree.file_names(tree.root_id()), vec!["file.txt"]);
    }

    #[tokio::test]
    async fn pages_accumulate_until_exhausted() {
        let dir = setup_test_dir(5);
        let (mut tree, home) = loaded_home(&dir, 2).await;
        let children = |t: &DirectoryTree| names(t, &t.get(home).unwrap().children);

        assert_eq!(children(&tree), vec!["sub1", "sub2", "more"]);

        assert!(tree.load_more(home, 2));
        assert_eq!(children(&tree), vec!["sub1", "sub2", "sub3", "sub4", "more"]);

        assert!(tree.load_more(home, 2));
        assert_eq!(
            children(&tree),
            vec!["sub1", "sub2", "sub3", "sub4", "sub5"]
        );

        assert!(!tree.load_more(home, 2));
        assert_eq!(tree.get(home).unwrap().children.len(), 5);
    }

    #[tokio::test]
    async fn node_count_follows_page_multiples() {
        let dir = setup_test_dir(7);
        let h = 3;
        let (mut tree, home) = loaded_home(&dir, h).await;
        let len = 7;
        for k in 0..3 {
            let node = tree.get(home).unwrap();
            let real = node
                .children
                .iter()
                .filter(|c| matches!(c, Child::Node(_)))
                .count();
            assert_eq!(real, len.min((k + 1) * h));
            assert_eq!(node.has_more(), real < len);
            tree.load_more(home, h);
        }
    }

    #[tokio::test]
    async fn small_directory_has_no_sentinel() {
        let dir = setup_test_dir(2);
        let (tree, home) = loaded_home(&dir, 5).await;
        let node = tree.get(home).unwrap();
        assert_eq!(node.children.len(), 2);
        assert!(!node.has_more());
    }

    #[tokio::test]
    async fn zero_page_size_is_treated_as_one() {
        let dir = setup_test_dir(3);
        let (mut tree, home) = loaded_home(&dir, 0).await;
        assert_eq!(names(&tree, &tree.get(home).unwrap().children), vec!["sub1", "more"]);
        tree.load_more(home, 0);
        assert_eq!(
            names(&tree, &tree.get(home).unwrap().children),
            vec!["sub1", "sub2", "more"]
        );
    }
}
