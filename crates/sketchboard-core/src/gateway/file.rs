//! File-backed gateway: one JSON file per board.

use super::{BoxFuture, GatewayError, GatewayResult, PersistenceGateway, timestamp};
use crate::elements::{Element, ElementId};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each board's element records as a JSON array in
/// `<base>/<board>.json`.
pub struct FileGateway {
    base_path: PathBuf,
}

impl FileGateway {
    /// Create a gateway rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> GatewayResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                GatewayError::Io(format!("Failed to create board directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Gateway in the platform data directory.
    ///
    /// On Unix: `~/.local/share/sketchboard/boards/`
    /// On Windows: `%LOCALAPPDATA%\sketchboard\boards\`
    pub fn default_location() -> GatewayResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| GatewayError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("sketchboard").join("boards"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Ids of every board with a file on disk.
    pub fn list_boards(&self) -> GatewayResult<Vec<String>> {
        let entries = fs::read_dir(&self.base_path)
            .map_err(|e| GatewayError::Io(format!("Failed to read directory: {}", e)))?;
        Ok(entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
            .collect())
    }

    fn board_path(&self, board_id: &str) -> PathBuf {
        let safe_id: String = board_id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    fn read_board(&self, board_id: &str) -> GatewayResult<Vec<Element>> {
        let path = self.board_path(board_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&path)
            .map_err(|e| GatewayError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&json).map_err(|e| {
            GatewayError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    fn write_board(&self, board_id: &str, elements: &[Element]) -> GatewayResult<()> {
        let path = self.board_path(board_id);
        let json = serde_json::to_string_pretty(elements)
            .map_err(|e| GatewayError::Serialization(e.to_string()))?;
        fs::write(&path, json)
            .map_err(|e| GatewayError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }
}

impl PersistenceGateway for FileGateway {
    fn insert_element(
        &self,
        board_id: &str,
        element: &Element,
    ) -> BoxFuture<'_, GatewayResult<Element>> {
        let board_id = board_id.to_string();
        let mut record = element.clone();
        Box::pin(async move {
            let mut elements = self.read_board(&board_id)?;
            if elements.iter().any(|e| e.id == record.id) {
                return Err(GatewayError::Duplicate(record.id));
            }
            record.created_at = Some(timestamp());
            elements.push(record.clone());
            self.write_board(&board_id, &elements)?;
            Ok(record)
        })
    }

    fn delete_elements_by_ids(
        &self,
        board_id: &str,
        ids: &[ElementId],
    ) -> BoxFuture<'_, GatewayResult<()>> {
        let board_id = board_id.to_string();
        let ids: HashSet<ElementId> = ids.iter().copied().collect();
        Box::pin(async move {
            let mut elements = self.read_board(&board_id)?;
            let before = elements.len();
            elements.retain(|e| !ids.contains(&e.id));
            if elements.len() != before {
                self.write_board(&board_id, &elements)?;
            }
            Ok(())
        })
    }

    fn delete_all_elements_for_board(&self, board_id: &str) -> BoxFuture<'_, GatewayResult<()>> {
        let path = self.board_path(board_id);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    GatewayError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn list_elements_for_board(
        &self,
        board_id: &str,
    ) -> BoxFuture<'_, GatewayResult<Vec<Element>>> {
        let board_id = board_id.to_string();
        Box::pin(async move { self.read_board(&board_id) })
    }

    fn delete_presence(&self, _board_id: &str, _user_id: &str) -> BoxFuture<'_, GatewayResult<()>> {
        // Presence is never written to disk.
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementStyle, Path as PenPath, Shape};
    use kurbo::Point;
    use pollster::block_on;
    use tempfile::tempdir;

    fn stroke() -> Element {
        Element::new(
            Shape::Path(PenPath::new(vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)])),
            ElementStyle::default(),
            "tester",
        )
    }

    #[test]
    fn test_insert_and_list() {
        let dir = tempdir().unwrap();
        let gateway = FileGateway::new(dir.path().to_path_buf()).unwrap();
        let element = stroke();

        block_on(gateway.insert_element("board-1", &element)).unwrap();
        let listed = block_on(gateway.list_elements_for_board("board-1")).unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, element.id);
        assert_eq!(listed[0].shape, element.shape);
        assert!(listed[0].created_at.is_some());
    }

    #[test]
    fn test_unknown_board_is_empty() {
        let dir = tempdir().unwrap();
        let gateway = FileGateway::new(dir.path().to_path_buf()).unwrap();
        assert!(block_on(gateway.list_elements_for_board("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_deletes() {
        let dir = tempdir().unwrap();
        let gateway = FileGateway::new(dir.path().to_path_buf()).unwrap();
        let a = stroke();
        let b = stroke();
        block_on(gateway.insert_element("board", &a)).unwrap();
        block_on(gateway.insert_element("board", &b)).unwrap();

        block_on(gateway.delete_elements_by_ids("board", &[a.id])).unwrap();
        let listed = block_on(gateway.list_elements_for_board("board")).unwrap();
        assert_eq!(listed.iter().map(|e| e.id).collect::<Vec<_>>(), vec![b.id]);

        block_on(gateway.delete_all_elements_for_board("board")).unwrap();
        assert!(gateway.list_boards().unwrap().is_empty());
    }

    #[test]
    fn test_sanitizes_board_id() {
        let dir = tempdir().unwrap();
        let gateway = FileGateway::new(dir.path().to_path_buf()).unwrap();
        block_on(gateway.insert_element("team/board:1", &stroke())).unwrap();

        assert_eq!(gateway.list_boards().unwrap(), vec!["team_board_1".to_string()]);
        assert_eq!(block_on(gateway.list_elements_for_board("team/board:1")).unwrap().len(), 1);
    }
}
