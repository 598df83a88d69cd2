//! Results table strategy.
//!
//! Reads the portal's results grid: one case per body row, five positional
//! cells, document links from the description cell. The first row is the
//! header.

use citius_record_models::{CaseRecord, FieldValue, fields};

use crate::dom::{DomError, Element, Locator, Page, collect_links};
use crate::normalize::normalize_fields;
use crate::strategy::{ExtractionOutcome, ExtractionStrategy, StrategyContext};

/// Field names of the grid columns, in column order.
pub const COLUMNS: [&str; 5] = [
    fields::TRIBUNAL,
    fields::PROCESSO,
    fields::DATA,
    fields::ATO,
    fields::DESCRICAO,
];

/// Column whose links are collected.
const LINK_COLUMN: usize = 4;

/// Reads the results `<table>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableStrategy;

impl<P: Page> ExtractionStrategy<P> for TableStrategy {
    fn name(&self) -> &'static str {
        "table"
    }

    fn attempt(&self, page: &P, ctx: &StrategyContext<'_>) -> ExtractionOutcome {
        let table_id = ctx.config.results_table_id.as_str();

        // ── Locate the table ────────────────────────────────────────────
        if page.find_first(&Locator::id(table_id)).is_none() {
            log::debug!("No results table '{table_id}' on the page");
            return ExtractionOutcome::NoMatch;
        }
        log::info!("Found results table");

        let rows = match page.find_all(&Locator::css(format!("#{table_id} > tbody > tr"))) {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("Could not list rows of the results table: {e}");
                return ExtractionOutcome::NoMatch;
            }
        };
        let data_rows = rows.get(1..).unwrap_or_default();
        log::info!("Processing {} table rows", data_rows.len());

        // ── Read rows ───────────────────────────────────────────────────
        ctx.progress.set_total(data_rows.len() as u64);
        ctx.progress.set_message("Reading results table".to_owned());

        let mut records = Vec::new();
        for (i, row) in data_rows.iter().enumerate() {
            if ctx.deadline.is_expired() {
                log::warn!(
                    "Extraction budget exhausted after {i} of {} rows",
                    data_rows.len()
                );
                break;
            }

            match read_row(row) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => log::debug!("Row {} has fewer than {} cells", i + 1, COLUMNS.len()),
                Err(e) if e.is_transient() => {
                    log::warn!("Row {} went stale during extraction, skipping", i + 1);
                }
                Err(e) => log::warn!("Failed to read row {}: {e}", i + 1),
            }
            ctx.progress.inc(1);
        }
        ctx.progress.finish_and_clear();

        ExtractionOutcome::from_records(records)
    }
}

/// Reads one body row, or `None` when it is too short to be a result.
fn read_row<E: Element>(row: &E) -> Result<Option<CaseRecord>, DomError> {
    let cells = row.find_all(&Locator::tag("td"))?;
    if cells.len() < COLUMNS.len() {
        return Ok(None);
    }

    let mut raw = Vec::with_capacity(COLUMNS.len() + 1);
    for (name, cell) in COLUMNS.iter().zip(&cells) {
        raw.push(((*name).to_owned(), FieldValue::Text(cell.text()?.trim().to_owned())));
    }

    let links = collect_links(&cells[LINK_COLUMN])?;
    if !links.is_empty() {
        raw.push((fields::LINKS.to_owned(), FieldValue::List(links)));
    }

    Ok(Some(normalize_fields(raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractConfig;
    use crate::fake::{FakeElement, FakePage};
    use crate::html::HtmlPage;

    const TABLE_ID: &str = "ctl00_ContentPlaceHolder1_gvResults";

    fn results_table(rows: &str) -> HtmlPage {
        HtmlPage::parse(format!(
            "<body><table id='{TABLE_ID}'>\
             <tr><th>Tribunal</th><th>Processo</th><th>Data</th><th>Ato</th><th>Descrição</th></tr>\
             {rows}</table></body>"
        ))
        .with_base_url("https://www.citius.mj.pt/portal/consultas/ConsultasCire.aspx")
        .unwrap()
    }

    fn attempt<P: Page>(page: &P, config: &ExtractConfig) -> ExtractionOutcome {
        TableStrategy.attempt(page, &StrategyContext::new(config, Some(2)))
    }

    #[test]
    fn reads_rows_and_links() {
        let page = results_table(
            "<tr><td> Lisboa </td><td>1/24</td><td>02-01-2025</td><td>Sentença</td>\
             <td>Declaração <a href='Anuncio.aspx?id=1'>ver</a></td></tr>\
             <tr><td>Porto</td><td>2/24</td><td>03-01-2025</td><td>Anúncio</td><td>Citação</td></tr>",
        );
        let records = attempt(&page, &ExtractConfig::default()).into_records();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            CaseRecord::new()
                .with(fields::TRIBUNAL, "Lisboa")
                .with(fields::PROCESSO, "1/24")
                .with(fields::DATA, "02-01-2025")
                .with(fields::ATO, "Sentença")
                .with(fields::DESCRICAO, "Declaração ver")
                .with(
                    fields::LINKS,
                    vec!["https://www.citius.mj.pt/portal/consultas/Anuncio.aspx?id=1".to_owned()]
                )
        );
        assert!(!records[1].contains(fields::LINKS));
    }

    #[test]
    fn skips_short_rows() {
        let page = results_table(
            "<tr><td colspan='5'>Página 1</td></tr>\
             <tr><td>Faro</td><td>3/24</td><td>04-01-2025</td><td>Ato</td><td>Texto</td></tr>",
        );
        let records = attempt(&page, &ExtractConfig::default()).into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(fields::TRIBUNAL), Some(&FieldValue::from("Faro")));
    }

    #[test]
    fn missing_table_is_no_match() {
        let page = HtmlPage::parse("<body><table id='other'><tr><td>x</td></tr></table></body>");
        assert_eq!(attempt(&page, &ExtractConfig::default()), ExtractionOutcome::NoMatch);
    }

    #[test]
    fn header_only_table_is_no_match() {
        let page = results_table("");
        assert_eq!(attempt(&page, &ExtractConfig::default()), ExtractionOutcome::NoMatch);
    }

    #[test]
    fn stale_row_is_skipped() {
        let good = COLUMNS
            .iter()
            .fold(FakeElement::new(""), |row, value| row.child("td", FakeElement::new(value)));
        let page = FakePage::new("")
            .element(&format!("#{TABLE_ID}"), FakeElement::new(""))
            .element(&format!("#{TABLE_ID} > tbody > tr"), FakeElement::new("header"))
            .element(&format!("#{TABLE_ID} > tbody > tr"), FakeElement::stale())
            .element(&format!("#{TABLE_ID} > tbody > tr"), good);

        let records = attempt(&page, &ExtractConfig::default()).into_records();

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].names().collect::<Vec<_>>(),
            COLUMNS.to_vec()
        );
    }

    #[test]
    fn expired_budget_keeps_nothing_further() {
        let page = results_table(
            "<tr><td>Faro</td><td>3/24</td><td>04-01-2025</td><td>Ato</td><td>Texto</td></tr>",
        );
        let config = ExtractConfig::default().with_budget_secs(0);
        assert_eq!(attempt(&page, &config), ExtractionOutcome::NoMatch);
    }
}
