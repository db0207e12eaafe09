use super::base::Result;

// Readers for the pipe-delimited configuration tables that drive scoring.
// A file is a sequence of $NAME: sections; each section is a table with a
// header row, a dashed separator, and data rows. Comment lines start with #.
// A cell may be "<" (copy the cell to its left), "^" (copy the cell above),
// or "-" (explicitly empty).

#[macro_export]
macro_rules! for_each_row {
  ($a:expr, [$($b:ident),+], $c:block) => {
    for ($($b),*) in $crate::util::table::parse_rows(&[$(stringify!($b)),*], $a)?
      .into_iter()
      .map(|x| match &x.as_slice() { &[$($b),*] => ($(($b).clone()),*), _ => panic!() })
    $c
  };
}

#[macro_export]
macro_rules! for_each_table {
  ($a:expr, [$($b:ident),+], $c:block) => {
    match &$crate::util::table::parse_tables(&[$(stringify!($b)),*], $a)?.as_slice() {
      &[$($b),*] => $c,
      _ => panic!(),
    }
  };
}

pub fn parse_rows(columns: &[&str], table: &str) -> Result<Vec<Vec<String>>> {
  let lines = table.split('\n').map(|x| x.trim());
  let valid: Vec<_> = lines.filter(|x| !(x.is_empty() || x.starts_with('#'))).collect();
  if valid.len() < 3 {
    Err(format!("Table must have a header, a separator, and at least one row:\n{}", table))?
  }
  let actual: Vec<_> = valid[0].split('|').map(|x| x.trim()).collect();
  if actual != columns {
    let (actual, columns) = (actual.join(", "), columns.join(", "));
    Err(format!("Table has columns: {}; expected: {}:\n{}", actual, columns, table))?
  }
  let n = columns.len();
  let (mut prev, mut result): (Vec<String>, Vec<Vec<String>>) = (vec![], vec![]);
  for (i, row) in valid[2..].iter().enumerate() {
    let cells: Vec<_> = row.split('|').map(|x| x.trim()).collect();
    if cells.len() != n {
      Err(format!("Row {} has {} fields; expected {}:\n{}", i + 1, cells.len(), n, table))?
    }
    let mut next: Vec<String> = Vec::with_capacity(n);
    for (j, cell) in cells.iter().enumerate() {
      let value = match *cell {
        "<" if j > 0 => Some(next[j - 1].clone()),
        "^" if i > 0 => Some(prev[j].clone()),
        "<" | "^" => None,
        "-" => Some(String::new()),
        x => Some(x.to_string()),
      };
      let value = value.ok_or(format!("Bad reference at row {}, column {}:\n{}", i + 1, j + 1, table));
      next.push(value?);
    }
    result.push(next.clone());
    prev = next;
  }
  Ok(result)
}

pub fn parse_tables<'a>(names: &[&str], text: &'a str) -> Result<Vec<&'a str>> {
  let blocks: Vec<_> = text.split('$').map(|x| x.trim()).collect();
  let preamble = blocks[0].lines().map(|x| x.trim()).all(|x| x.is_empty() || x.starts_with('#'));
  if blocks.len() < 2 || !preamble {
    Err(format!("Table list must start with a $NAME: section:\n{}", text))?
  }
  let (mut actual, mut result) = (vec![], vec![]);
  for block in blocks.iter().skip(1) {
    let first = block.split('\n').next().unwrap_or("").trim();
    let index = first.find(':').ok_or_else(|| format!("Section must start with NAME: {}", first))?;
    actual.push(block[..index].to_lowercase());
    result.push(&block[index + 1..]);
  }
  if actual != names {
    let (actual, names) = (actual.join(", "), names.join(", "));
    Err(format!("Table list has sections: {}; expected: {}", actual, names))?
  }
  Ok(result)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn test_error<T: std::fmt::Debug>(result: Result<T>, prefix: &str) {
    let error = format!("{:?}", result.unwrap_err());
    if !error.starts_with(prefix) {
      let error = error.split('\n').next().unwrap_or("");
      panic!("Error does not match prefix:\nexpected: {:?}\n  actual: {:?}", prefix, error);
    }
  }

  #[test]
  fn valid_table_with_references() {
    let table = "
      # Comments and blank lines are skipped anywhere in the table.

      lemma | case
      ------|-----
      sakna | ef
          ^ | <
          ^ | ef
      vænta | -
    ";
    assert_eq!(
      parse_rows(&["lemma", "case"], table).unwrap(),
      [["sakna", "ef"], ["sakna", "sakna"], ["sakna", "ef"], ["vænta", ""]],
    );
  }

  #[test]
  fn table_without_rows() {
    let table = "
      lemma | case
      ------|-----
      #skip | ^
    ";
    test_error(
      parse_rows(&["lemma", "case"], table),
      "Table must have a header, a separator, and at least one row:",
    );
  }

  #[test]
  fn table_with_wrong_columns() {
    let table = "
      lemma | case | extra
      ------|------|------
      sakna | ef   | x
    ";
    test_error(
      parse_rows(&["lemma", "extra", "case"], table),
      "Table has columns: lemma, case, extra; expected: lemma, extra, case:",
    );
  }

  #[test]
  fn table_with_short_row() {
    let table = "
      lemma | case | extra
      ------|------|------
      sakna | ef
    ";
    test_error(parse_rows(&["lemma", "case", "extra"], table), "Row 1 has 2 fields; expected 3:");
  }

  #[test]
  fn table_with_bad_reference() {
    let table = "
      lemma | case
      ------|-----
          ^ | ef
    ";
    test_error(parse_rows(&["lemma", "case"], table), "Bad reference at row 1, column 1:");
  }

  #[test]
  fn sections_split_and_validate() {
    let text = "
      # A comment before the first section is fine.

      $verbs:
      lemma | cases
      ------|------
      sjá   | þf

      $prepositions:
      lemma | cases
      ------|------
      af    | þgf
    ";
    let tables = parse_tables(&["verbs", "prepositions"], text).unwrap();
    assert_eq!(tables.len(), 2);
    assert!(tables[0].contains("sjá"));
    assert!(tables[1].contains("af"));
    test_error(
      parse_tables(&["prepositions", "verbs"], text),
      "Table list has sections: verbs, prepositions; expected: prepositions, verbs",
    );
  }
}
