//! Prompt for hierarchical header annotation.

use formlens_core::{CellsPayload, HeaderAnnotation};

/// Instruction text for the multimodal model, with the caller's cells appended verbatim.
pub fn build_header_prompt(cells: &CellsPayload) -> String {
    let example = HeaderAnnotation::from_levels(&["Operating expenses", "Salaries"], &["2023", "Q4"]);
    let field = HeaderAnnotation::FIELD;
    let sep = HeaderAnnotation::SEPARATOR;

    format!(
        "You are looking at an image of a table. Below is a JSON array of cells that were \
extracted from this table by OCR. Each cell carries an identifier and its text.\n\
\n\
For every cell, use the image to determine its row header and its column header. \
Headers can be nested: a column may sit under a spanning parent header, and a row may be \
a subheading inside a section. Include every level from the outermost to the innermost, \
joined with \"{sep}\".\n\
\n\
Return the same JSON array. Keep every cell and every existing field exactly as given, \
and add one field to each cell named \"{field}\" whose value is an object with two string \
fields, \"row_header\" and \"column_header\". Use an empty string when a cell has no header \
in that direction. For example:\n\
{{\"{field}\": {{\"row_header\": \"{row}\", \"column_header\": \"{col}\"}}}}\n\
\n\
Respond with the JSON array only, inside a ```json code block.\n\
\n\
Cells:\n{cells}",
        row = example.row_header,
        col = example.column_header,
        cells = cells.as_str(),
    )
}
