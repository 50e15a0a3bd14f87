//! 以目录为存储的脚本来源

use std::path::PathBuf;

use reply_rules::ScriptSource;
use tracing::debug;

/// 从目录中按文件名读取脚本
pub struct ScriptDir {
    root: PathBuf,
}

impl ScriptDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ScriptSource for ScriptDir {
    fn load(&self, name: &str) -> Option<String> {
        let path = self.root.join(name);
        match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "读取脚本失败");
                None
            }
        }
    }
}
