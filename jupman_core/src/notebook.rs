use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde_json::Map;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::JupmanResult;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
	Code,
	Markdown,
	Raw,
}

/// One notebook cell. Keys this type does not model (`outputs`,
/// `execution_count`, `attachments`, `id`, …) are kept in `extra` and
/// written back untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Cell {
	pub cell_type: CellType,
	#[serde(default)]
	pub metadata: Map<String, Value>,
	#[serde(
		deserialize_with = "source_deserialize",
		serialize_with = "source_serialize"
	)]
	pub source: String,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Cell {
	fn new(cell_type: CellType, source: impl Into<String>) -> Self {
		let mut extra = Map::new();
		if cell_type == CellType::Code {
			extra.insert("execution_count".into(), Value::Null);
			extra.insert("outputs".into(), Value::Array(vec![]));
		}

		Self {
			cell_type,
			metadata: Map::new(),
			source: source.into(),
			extra,
		}
	}

	pub fn code(source: impl Into<String>) -> Self {
		Self::new(CellType::Code, source)
	}

	pub fn markdown(source: impl Into<String>) -> Self {
		Self::new(CellType::Markdown, source)
	}

	pub fn raw(source: impl Into<String>) -> Self {
		Self::new(CellType::Raw, source)
	}

	pub fn is_code(&self) -> bool {
		self.cell_type == CellType::Code
	}

	pub fn has_outputs(&self) -> bool {
		self.extra
			.get("outputs")
			.and_then(Value::as_array)
			.is_some_and(|outputs| !outputs.is_empty())
	}

	/// Same cell with another source.
	#[must_use]
	pub fn with_source(&self, source: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			..self.clone()
		}
	}

	/// Same cell without outputs or execution count. Only code cells carry
	/// them.
	#[must_use]
	pub fn without_outputs(mut self) -> Self {
		if self.is_code() {
			self.extra.insert("execution_count".into(), Value::Null);
			self.extra.insert("outputs".into(), Value::Array(vec![]));
		}
		self
	}
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Notebook {
	pub cells: Vec<Cell>,
	#[serde(default)]
	pub metadata: Map<String, Value>,
	#[serde(default = "default_nbformat")]
	pub nbformat: i64,
	#[serde(default = "default_nbformat_minor")]
	pub nbformat_minor: i64,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

fn default_nbformat() -> i64 {
	4
}

fn default_nbformat_minor() -> i64 {
	5
}

impl Default for Notebook {
	fn default() -> Self {
		Self {
			cells: vec![],
			metadata: Map::new(),
			nbformat: default_nbformat(),
			nbformat_minor: default_nbformat_minor(),
			extra: Map::new(),
		}
	}
}

impl Notebook {
	pub fn new(cells: Vec<Cell>) -> Self {
		Self {
			cells,
			..Self::default()
		}
	}

	pub fn from_json(json: &str) -> JupmanResult<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// The canonical on-disk form: sorted keys, one-space indentation and a
	/// trailing newline.
	pub fn to_json(&self) -> JupmanResult<String> {
		// `Value` maps are ordered by key.
		let value = serde_json::to_value(self)?;
		let mut buffer = Vec::new();
		let formatter = PrettyFormatter::with_indent(b" ");
		let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
		value.serialize(&mut serializer)?;
		buffer.push(b'\n');

		Ok(String::from_utf8_lossy(&buffer).into_owned())
	}

	/// A new notebook with every cell passed through `f`. Cell order and
	/// count are kept.
	#[must_use]
	pub fn map_cells(&self, mut f: impl FnMut(usize, &Cell) -> Cell) -> Self {
		Self {
			cells: self
				.cells
				.iter()
				.enumerate()
				.map(|(idx, cell)| f(idx, cell))
				.collect(),
			..self.clone()
		}
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MultilineString {
	Single(String),
	Lines(Vec<String>),
}

fn source_deserialize<'de, D>(input: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	let source = match MultilineString::deserialize(input)? {
		MultilineString::Single(source) => source,
		MultilineString::Lines(lines) => lines.concat(),
	};
	Ok(source)
}

fn source_serialize<S>(value: &str, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.collect_seq(value.split_inclusive('\n'))
}
