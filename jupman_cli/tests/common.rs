#![allow(dead_code)]

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub const SOLUTION_SCRIPT: &str = "# Python
import sys
sys.path.append('../')
import jupman

def add(a, b):
    #jupman-raise
    return a + b
    #/jupman-raise

#jupman-strip
print('stripped!')
#/jupman-strip
#jupman-purge
print('purged!')
#/jupman-purge
";

pub fn jupman_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("jupman"));
	cmd.env("NO_COLOR", "1");
	cmd
}

/// A notebook with the given `(cell_type, source)` cells.
pub fn notebook_json(cells: &[(&str, &str)]) -> String {
	let cells: Vec<serde_json::Value> = cells
		.iter()
		.map(|(cell_type, source)| {
			if *cell_type == "code" {
				serde_json::json!({
					"cell_type": "code",
					"execution_count": 1,
					"metadata": {},
					"outputs": [],
					"source": source,
				})
			} else {
				serde_json::json!({
					"cell_type": cell_type,
					"metadata": {},
					"source": source,
				})
			}
		})
		.collect();

	serde_json::json!({
		"cells": cells,
		"metadata": {},
		"nbformat": 4,
		"nbformat_minor": 5,
	})
	.to_string()
}
