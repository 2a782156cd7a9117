use std::path::Path;

use serde_json::json;

use crate::notebook::Cell;
use crate::notebook::Notebook;
use crate::uproot::MemoryClassifier;

pub const PYTHON_SOLUTION: &str = "# Python
import sys
sys.path.append('../../')
import jupman

# work!
#jupman-raise
print('hi')
#/jupman-raise

#jupman-strip
print('stripped!')
#/jupman-strip
#jupman-purge
print('purged!')
#/jupman-purge
";

pub const PYTHON_TEST: &str = "# Python
import some_sol
import sys
sys.path.append('../../')
import jupman

def test_add():
    pass
";

pub const PURGE_ONLY: &str = "x = 9\n#jupman-purge\ny = 'purged!'\n#/jupman-purge\n# after";

/// The tree used by the uproot tests.
pub fn course_tree() -> MemoryClassifier {
	MemoryClassifier::new()
		.with_file("jupman.py")
		.with_file("_test/test-chapter/data/pop.csv")
		.with_file("_static/img/cc-by.png")
}

/// Create the same tree as `course_tree` on disk.
pub fn write_course_tree(root: &Path) {
	for file in ["jupman.py", "_test/test-chapter/data/pop.csv", "_static/img/cc-by.png"] {
		let path = root.join(file);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create dir: {e}"));
		}
		std::fs::write(&path, "x").unwrap_or_else(|e| panic!("write {file}: {e}"));
	}
}

fn code_with_output(source: &str) -> Cell {
	let mut cell = Cell::code(source);
	cell.extra.insert("execution_count".into(), json!(3));
	cell.extra.insert(
		"outputs".into(),
		json!([{ "name": "stdout", "output_type": "stream", "text": ["solution output\n"] }]),
	);
	cell
}

/// A lesson notebook holding one of each tag, cell by cell.
pub fn lesson_notebook() -> Notebook {
	Notebook::new(vec![
		Cell::markdown("# Notebook EXERCISES"),
		Cell::code("#before\n#jupman-raise\nx = 1\n#/jupman-raise\n"),
		code_with_output("# SOLUTION\nx = 2\nprint(x)\n"),
		Cell::code("# 3\n# write here\nx = 3\n"),
		Cell::markdown("What is the answer?"),
		Cell::markdown("**ANSWER**: 42, of course"),
		Cell::code("x = 6\n# write here fast please\ny = 6\n"),
		Cell::code("# SOLUTION\n# write here\nx = 7\n"),
		Cell::code("x = 8\n\n#jupman-strip\nstripped!\n#/jupman-strip\n# after"),
		Cell::code("x = 9\n\n#jupman-purge\npurged!9\n#/jupman-purge\n# after"),
		Cell::code(
			"#jupman-strip\nstripped!\n#/jupman-strip\n#jupman-purge\npurged!10\n#/jupman-purge\n",
		),
		code_with_output("print('untagged')\n"),
	])
}

/// Cells with every kind of reference that export relocates.
pub fn links_notebook() -> Notebook {
	Notebook::new(vec![
		Cell::markdown("# Links"),
		Cell::markdown("[some link](../../index.ipynb)"),
		Cell::markdown("![some link](../../_static/img/cc-by.png)"),
		Cell::markdown("[some link](data/pop.csv)"),
		Cell::markdown("<a href=\"../../index.ipynb\" target=\"_blank\">a link</a>"),
		Cell::markdown("<img src=\"../../_static/img/cc-by.png\">"),
		Cell::markdown("<a href=\"https://jupman.softpython.org\">a link</a>"),
		Cell::code("# Python\nimport sys\nsys.path.append('../../')\nimport jupman\n#jupman-raise\nx = 1\n#/jupman-raise\n"),
	])
}
