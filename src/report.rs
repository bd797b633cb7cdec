use finhealth::domain::Series;
use rust_decimal::Decimal;

/// Two decimal places, rounded (`{:.2}` alone would truncate a `Decimal`).
pub fn money(d: Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn percent(d: Decimal) -> String {
    format!("{:.2}%", d.round_dp(2))
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if headers.is_empty() {
        println!("(no columns)");
        return;
    }

    let cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();

    for row in rows {
        for (i, cell) in row.iter().take(cols).enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    fn print_row(cells: &[String], widths: &[usize]) {
        print!("|");
        for (i, w) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            print!(" {:width$} |", cell, width = *w);
        }
        println!();
    }

    fn print_sep(widths: &[usize]) {
        print!("|");
        for w in widths {
            print!("{}|", "-".repeat(w + 2));
        }
        println!();
    }

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    print_row(&header_cells, &widths);
    print_sep(&widths);
    for row in rows {
        print_row(row, &widths);
    }
}

/// Two-column table of a labeled series.
pub fn print_series(label_header: &str, value_header: &str, series: &Series) {
    if series.is_empty() {
        println!("(no data)");
        return;
    }
    let rows: Vec<Vec<String>> = series
        .iter()
        .map(|(label, value)| vec![label.to_string(), money(value)])
        .collect();
    print_table(&[label_header, value_header], &rows);
}
