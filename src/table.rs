use scraper::{ElementRef, Html, Node};

const MAX_COLSPAN: usize = 1000;
const MAX_ROWSPAN: usize = 65534;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HtmlTable {
    pub headers: Vec<String>,
    // padded to headers.len()
    pub rows: Vec<Vec<Option<String>>>,
    pub text: String,
}

struct RawCell {
    text: String,
    is_header: bool,
    colspan: usize,
    rowspan: usize,
}

struct RawRow {
    cells: Vec<RawCell>,
    in_thead: bool,
}

struct Carry {
    text: String,
    is_header: bool,
    rows_left: usize,
}

struct GridRow {
    cells: Vec<Option<String>>,
    is_header: bool,
}

pub fn parse_tables(html: &str) -> Vec<HtmlTable> {
    let doc = Html::parse_document(html);
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "table")
        .map(build_table)
        .collect()
}

fn build_table(table: ElementRef<'_>) -> HtmlTable {
    let raw = collect_rows(table);
    let grid = expand_spans(raw);

    let header_count = grid.iter().take_while(|r| r.is_header).count();
    let (header_rows, body_rows) = grid.split_at(header_count);

    let width = grid.iter().map(|r| r.cells.len()).max().unwrap_or(0);

    let headers = (0..width)
        .map(|col| {
            let mut parts: Vec<&str> = Vec::new();
            for row in header_rows {
                if let Some(Some(text)) = row.cells.get(col) {
                    if parts.last() != Some(&text.as_str()) {
                        parts.push(text);
                    }
                }
            }
            parts.join(" ")
        })
        .collect();

    let rows = body_rows
        .iter()
        .map(|row| {
            let mut cells = row.cells.clone();
            cells.resize(width, None);
            cells
        })
        .collect();

    HtmlTable { headers, rows, text: cell_text(table) }
}

// Nested tables are parsed on their own.
fn collect_rows(table: ElementRef<'_>) -> Vec<RawRow> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(read_row(child, false)),
            section @ ("thead" | "tbody" | "tfoot") => {
                let in_thead = section == "thead";
                for tr in child.children().filter_map(ElementRef::wrap) {
                    if tr.value().name() == "tr" {
                        rows.push(read_row(tr, in_thead));
                    }
                }
            },
            _ => {},
        }
    }
    rows
}

fn read_row(tr: ElementRef<'_>, in_thead: bool) -> RawRow {
    let cells = tr
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|c| matches!(c.value().name(), "td" | "th"))
        .map(|c| RawCell {
            text: cell_text(c),
            is_header: c.value().name() == "th",
            colspan: span_attr(c, "colspan", MAX_COLSPAN),
            rowspan: span_attr(c, "rowspan", MAX_ROWSPAN),
        })
        .collect();
    RawRow { cells, in_thead }
}

fn span_attr(el: ElementRef<'_>, name: &str, max: usize) -> usize {
    el.value()
        .attr(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, max)
}

fn expand_spans(raw: Vec<RawRow>) -> Vec<GridRow> {
    let mut carries: Vec<Option<Carry>> = Vec::new();
    let mut grid = Vec::with_capacity(raw.len());

    for row in raw {
        let mut out = PartialRow::default();
        let mut col = 0;

        for cell in row.cells {
            while take_carry(&mut carries, col, &mut out) {
                col += 1;
            }
            for _ in 0..cell.colspan {
                out.push(non_empty(&cell.text), cell.is_header);
                if cell.rowspan > 1 {
                    if carries.len() <= col {
                        carries.resize_with(col + 1, || None);
                    }
                    carries[col] = Some(Carry {
                        text: cell.text.clone(),
                        is_header: cell.is_header,
                        rows_left: cell.rowspan - 1,
                    });
                }
                col += 1;
            }
        }
        while col < carries.len() {
            if !take_carry(&mut carries, col, &mut out) {
                out.push(None, false);
            }
            col += 1;
        }

        let is_header = row.in_thead || (!out.flags.is_empty() && out.flags.iter().all(|h| *h));
        grid.push(GridRow { cells: out.cells, is_header });
    }

    grid
}

#[derive(Default)]
struct PartialRow {
    cells: Vec<Option<String>>,
    flags: Vec<bool>,
}

impl PartialRow {
    fn push(&mut self, cell: Option<String>, is_header: bool) {
        self.cells.push(cell);
        self.flags.push(is_header);
    }
}

fn take_carry(carries: &mut [Option<Carry>], col: usize, out: &mut PartialRow) -> bool {
    let Some(slot) = carries.get_mut(col) else {
        return false;
    };
    let Some(carry) = slot.as_mut() else {
        return false;
    };
    out.push(non_empty(&carry.text), carry.is_header);
    carry.rows_left -= 1;
    if carry.rows_left == 0 {
        *slot = None;
    }
    true
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() { None } else { Some(text.to_string()) }
}

pub fn cell_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_visible_text(el, &mut raw);
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    strip_footnote_markers(&collapsed).to_string()
}

fn push_visible_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) => {
                if e.name() == "br" {
                    out.push(' ');
                    continue;
                }
                let Some(child_el) = ElementRef::wrap(child) else { continue };
                if is_hidden(child_el) {
                    continue;
                }
                push_visible_text(child_el, out);
            },
            _ => {},
        }
    }
}

fn is_hidden(el: ElementRef<'_>) -> bool {
    let e = el.value();
    match e.name() {
        "style" | "script" => return true,
        "sup" if e.classes().any(|c| c == "reference") => return true,
        _ => {},
    }
    if e.classes().any(|c| c == "sortkey") {
        return true;
    }
    e.attr("style")
        .map(|s| s.replace(' ', "").to_ascii_lowercase().contains("display:none"))
        .unwrap_or(false)
}

pub fn strip_footnote_markers(s: &str) -> &str {
    let mut out = s.trim_end();
    while out.ends_with(']') {
        let Some(open) = out.rfind('[') else { break };
        if !is_footnote_marker(&out[open + 1..out.len() - 1]) {
            break;
        }
        out = out[..open].trim_end();
    }
    out
}

// `a`, `12`, `note 3`.
fn is_footnote_marker(inner: &str) -> bool {
    let is_number = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    let mut chars = inner.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => true,
        _ => {
            is_number(inner)
                || inner.strip_prefix("note ").is_some_and(|n| is_number(n) || n.len() == 1)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thead_and_leading_th_rows_become_headers() {
        let html = r#"
            <table>
              <thead><tr><th>Title</th><th>Release date</th></tr></thead>
              <tbody><tr><td>A</td><td>1998</td></tr></tbody>
            </table>
            <table>
              <tr><th>Title</th><th>Year</th></tr>
              <tr><th scope="row">B</th><td>2001</td></tr>
            </table>"#;
        let tables = parse_tables(html);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].headers, vec!["Title", "Release date"]);
        assert_eq!(tables[0].rows, vec![vec![Some("A".into()), Some("1998".into())]]);
        assert_eq!(tables[1].headers, vec!["Title", "Year"]);
        assert_eq!(tables[1].rows, vec![vec![Some("B".into()), Some("2001".into())]]);
    }

    #[test]
    fn multi_level_headers_are_flattened() {
        let html = r#"
            <table>
              <tr><th rowspan="2">Title</th><th colspan="2">Release date</th></tr>
              <tr><th>Japan</th><th>US</th></tr>
              <tr><td>A</td><td>1998</td><td>1999</td></tr>
            </table>"#;
        let table = &parse_tables(html)[0];
        assert_eq!(table.headers, vec!["Title", "Release date Japan", "Release date US"]);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn rowspan_repeats_value_down_the_column() {
        let html = r#"
            <table>
              <tr><th>Title</th><th>Release</th></tr>
              <tr><td>A</td><td rowspan="2">1998</td></tr>
              <tr><td>B</td></tr>
              <tr><td>C</td><td>2000</td></tr>
            </table>"#;
        let table = &parse_tables(html)[0];
        let release: Vec<_> = table.rows.iter().map(|r| r[1].as_deref()).collect();
        assert_eq!(release, vec![Some("1998"), Some("1998"), Some("2000")]);
    }

    #[test]
    fn short_rows_are_padded_with_none() {
        let html = r#"
            <table>
              <tr><th>Title</th><th>Release</th><th>Notes</th></tr>
              <tr><td>A</td></tr>
            </table>"#;
        let table = &parse_tables(html)[0];
        assert_eq!(table.rows, vec![vec![Some("A".into()), None, None]]);
    }

    #[test]
    fn nested_tables_keep_their_rows() {
        let html = r#"
            <table>
              <tr><th>Outer</th></tr>
              <tr><td><table><tr><th>Inner</th></tr><tr><td>x</td></tr></table></td></tr>
            </table>"#;
        let tables = parse_tables(html);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].headers, vec!["Outer"]);
        assert_eq!(tables[0].rows.len(), 1);
        assert_eq!(tables[1].headers, vec!["Inner"]);
        assert_eq!(tables[1].rows, vec![vec![Some("x".into())]]);
    }

    #[test]
    fn cell_text_skips_footnotes_and_hidden_sort_keys() {
        let html = r#"
            <table>
              <tr><th>Title<sup class="reference">[a]</sup></th><th>Release</th></tr>
              <tr>
                <td><i>Pokémon:&nbsp;The First&nbsp;Movie</i><sup class="reference"><a>[3]</a></sup></td>
                <td><span style="display: none">000000001998-07-18</span>July 18,<br>1998</td>
              </tr>
            </table>"#;
        let table = &parse_tables(html)[0];
        assert_eq!(table.headers, vec!["Title", "Release"]);
        assert_eq!(
            table.rows[0],
            vec![Some("Pokémon: The First Movie".into()), Some("July 18, 1998".into())]
        );
    }

    #[test]
    fn bracketed_words_in_titles_are_kept() {
        assert_eq!(strip_footnote_markers("Origins [OVA]"), "Origins [OVA]");
        assert_eq!(strip_footnote_markers("Returns [TV special]"), "Returns [TV special]");
        assert_eq!(strip_footnote_markers("Origins [OVA][2]"), "Origins [OVA]");
        assert_eq!(strip_footnote_markers("Kanto [12b]"), "Kanto [12b]");
    }

    #[test]
    fn strips_plain_text_footnote_markers() {
        assert_eq!(strip_footnote_markers("Mewtwo Strikes Back[a][12]"), "Mewtwo Strikes Back");
        assert_eq!(strip_footnote_markers("Jirachi [note 1] "), "Jirachi");
        assert_eq!(strip_footnote_markers("Range [1998–2000]"), "Range [1998–2000]");
        assert_eq!(strip_footnote_markers("[1]"), "");
        assert_eq!(strip_footnote_markers("Hoopa [note b]"), "Hoopa");
    }
}
