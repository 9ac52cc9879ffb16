//! In-memory card image
//!
//! Directories remember the order children were added in, which stands in
//! for the native enumeration order of a FAT volume.

use std::collections::HashMap;
use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{join, parent, ChildEntry, Children, Filesystem, Metadata};

#[derive(Debug, Clone)]
enum Node {
    File(Arc<Mutex<Vec<u8>>>),
    Dir(Vec<String>),
}

/// Card image held entirely in memory
#[derive(Debug)]
pub struct MemoryFilesystem {
    nodes: Mutex<HashMap<String, Node>>,
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFilesystem {
    /// Empty card with only the root directory
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert("/".to_string(), Node::Dir(Vec::new()));
        Self {
            nodes: Mutex::new(nodes),
        }
    }

    /// Create a directory and any missing parents
    pub fn add_dir(&self, path: &str) -> &Self {
        let path = normalize(path);
        let mut nodes = self.lock();
        ensure_dir(&mut nodes, &path);
        self
    }

    /// Create or replace a file, creating missing parent directories
    pub fn add_file(&self, path: &str, contents: impl AsRef<[u8]>) -> &Self {
        let path = normalize(path);
        let mut nodes = self.lock();
        ensure_dir(&mut nodes, parent(&path));
        insert_file(&mut nodes, &path, contents.as_ref().to_vec());
        self
    }

    /// Current contents of a file
    pub fn read_file(&self, path: &str) -> Option<Vec<u8>> {
        match self.lock().get(&normalize(path)) {
            Some(Node::File(data)) => Some(lock_data(data).clone()),
            _ => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Node>> {
        self.nodes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn lock_data(data: &Mutex<Vec<u8>>) -> MutexGuard<'_, Vec<u8>> {
    data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn ensure_dir(nodes: &mut HashMap<String, Node>, path: &str) {
    if nodes.contains_key(path) {
        return;
    }
    let up = parent(path).to_string();
    ensure_dir(nodes, &up);
    link_child(nodes, &up, path);
    nodes.insert(path.to_string(), Node::Dir(Vec::new()));
}

fn insert_file(nodes: &mut HashMap<String, Node>, path: &str, contents: Vec<u8>) -> Arc<Mutex<Vec<u8>>> {
    if let Some(Node::File(data)) = nodes.get(path) {
        *lock_data(data) = contents;
        return data.clone();
    }
    link_child(nodes, parent(path), path);
    let data = Arc::new(Mutex::new(contents));
    nodes.insert(path.to_string(), Node::File(data.clone()));
    data
}

fn link_child(nodes: &mut HashMap<String, Node>, dir: &str, child: &str) {
    if let Some(Node::Dir(children)) = nodes.get_mut(dir) {
        let name = child.rsplit('/').next().unwrap_or(child).to_string();
        if !children.contains(&name) {
            children.push(name);
        }
    }
}

/// Writer appending to an in-memory file
#[derive(Debug)]
pub struct MemoryWriter {
    data: Arc<Mutex<Vec<u8>>>,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock_data(&self.data).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Filesystem for MemoryFilesystem {
    type Reader = Cursor<Vec<u8>>;
    type Writer = MemoryWriter;

    fn metadata(&self, path: &str) -> io::Result<Metadata> {
        match self.lock().get(&normalize(path)) {
            Some(Node::Dir(_)) => Ok(Metadata { is_dir: true, len: 0 }),
            Some(Node::File(data)) => Ok(Metadata {
                is_dir: false,
                len: lock_data(data).len() as u64,
            }),
            None => Err(io::Error::new(io::ErrorKind::NotFound, path.to_string())),
        }
    }

    fn read_dir(&self, path: &str) -> io::Result<Children<'_>> {
        let dir = normalize(path);
        let nodes = self.lock();
        let children = match nodes.get(&dir) {
            Some(Node::Dir(children)) => children,
            Some(Node::File(_)) => {
                return Err(io::Error::new(io::ErrorKind::NotADirectory, path.to_string()));
            }
            None => return Err(io::Error::new(io::ErrorKind::NotFound, path.to_string())),
        };

        let entries: Vec<ChildEntry> = children
            .iter()
            .map(|name| {
                let child = join(&dir, name);
                let is_dir = matches!(nodes.get(&child), Some(Node::Dir(_)));
                ChildEntry { path: child, is_dir }
            })
            .collect();
        Ok(Box::new(entries.into_iter().map(Ok)))
    }

    fn open_read(&self, path: &str) -> io::Result<Cursor<Vec<u8>>> {
        match self.lock().get(&normalize(path)) {
            Some(Node::File(data)) => Ok(Cursor::new(lock_data(data).clone())),
            Some(Node::Dir(_)) => Err(io::Error::new(io::ErrorKind::IsADirectory, path.to_string())),
            None => Err(io::Error::new(io::ErrorKind::NotFound, path.to_string())),
        }
    }

    fn create(&self, path: &str) -> io::Result<MemoryWriter> {
        let path = normalize(path);
        let mut nodes = self.lock();
        match nodes.get(parent(&path)) {
            Some(Node::Dir(_)) => {}
            _ => return Err(io::Error::new(io::ErrorKind::NotFound, path)),
        }
        if let Some(Node::Dir(_)) = nodes.get(&path) {
            return Err(io::Error::new(io::ErrorKind::IsADirectory, path));
        }
        let data = insert_file(&mut nodes, &path, Vec::new());
        Ok(MemoryWriter { data })
    }
}
