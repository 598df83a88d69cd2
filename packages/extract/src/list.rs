//! Results list strategy.
//!
//! Some searches render each case as a `<div>` inside the results container
//! with one labelled `<span>` per field. Items are located with three
//! selector tiers, the first that finds anything wins. A container with no
//! recognisable items is read as free text instead.

use citius_record_models::{CaseRecord, FieldValue, fields};

use crate::dom::{DomError, Element, Locator, Page, collect_links};
use crate::normalize::{normalize_blob, normalize_fields};
use crate::strategy::{ExtractionOutcome, ExtractionStrategy, StrategyContext};

/// Labelled spans read from each item: field name and span selector.
pub const ITEM_FIELDS: [(&str, &str); 7] = [
    (fields::TRIBUNAL, "span[id*='lblTribunal']"),
    (fields::PROCESSO, "span[id*='lblProcesso']"),
    (fields::DATA, "span[id*='lblData']"),
    (fields::ATO, "span[id*='lblAto']"),
    (fields::DESCRICAO, "span[id*='lblDescricao'], span[id*='lblTexto']"),
    (fields::INTERVENIENTE, "span[id*='lblInterveniente']"),
    (fields::NIF_NIPC, "span[id*='lblNIF']"),
];

/// Reads the results container's item list.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListStrategy;

impl<P: Page> ExtractionStrategy<P> for ListStrategy {
    fn name(&self) -> &'static str {
        "list"
    }

    fn attempt(&self, page: &P, ctx: &StrategyContext<'_>) -> ExtractionOutcome {
        let container_id = ctx.config.results_container_id.as_str();
        let Some(container) = page.find_first(&Locator::id(container_id)) else {
            log::debug!("No results container '{container_id}' on the page");
            return ExtractionOutcome::NoMatch;
        };
        log::info!("Found results container");

        let items = find_items(page, &container, ctx);
        if items.is_empty() {
            return read_container_text(&container, ctx);
        }
        log::info!("Processing {} result items", items.len());

        ctx.progress.set_total(items.len() as u64);
        ctx.progress.set_message("Reading results list".to_owned());

        let mut records = Vec::new();
        for (i, item) in items.iter().enumerate() {
            if ctx.deadline.is_expired() {
                log::warn!(
                    "Extraction budget exhausted after {i} of {} items",
                    items.len()
                );
                break;
            }

            match read_item(item) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => log::debug!("Item {} is empty", i + 1),
                Err(e) if e.is_transient() => {
                    log::warn!("Item {} went stale during extraction, skipping", i + 1);
                }
                Err(e) => {
                    log::warn!("Failed to read fields of item {}: {e}", i + 1);
                    if let Some(record) = full_text_record(item) {
                        records.push(record);
                    }
                }
            }
            ctx.progress.inc(1);
        }
        ctx.progress.finish_and_clear();

        ExtractionOutcome::from_records(records)
    }
}

/// Tries the page-wide selectors, then the container-scoped one.
fn find_items<'p, P: Page>(
    page: &'p P,
    container: &P::Element<'p>,
    ctx: &StrategyContext<'_>,
) -> Vec<P::Element<'p>> {
    for selector in [&ctx.config.item_selector, &ctx.config.item_fallback_selector] {
        match page.find_all(&Locator::css(selector.as_str())) {
            Ok(items) if !items.is_empty() => return items,
            Ok(_) => log::debug!("No result items match '{selector}'"),
            Err(e) => log::warn!("Result item lookup failed: {e}"),
        }
    }

    container
        .find_all(&Locator::css(ctx.config.nested_item_selector.as_str()))
        .unwrap_or_else(|e| {
            log::warn!("Nested result item lookup failed: {e}");
            Vec::new()
        })
}

/// Reads the labelled spans and links of one item.
///
/// An item with none of the labelled spans is kept as its full text.
fn read_item<E: Element>(item: &E) -> Result<Option<CaseRecord>, DomError> {
    let mut raw: Vec<(String, FieldValue)> = Vec::new();
    for (name, selector) in ITEM_FIELDS {
        if let Some(span) = item.find_all(&Locator::css(selector))?.into_iter().next() {
            raw.push((name.to_owned(), FieldValue::Text(span.text()?.trim().to_owned())));
        }
    }
    let labelled = raw.len();

    let links = collect_links(item)?;
    if !links.is_empty() {
        raw.push((fields::LINKS.to_owned(), FieldValue::List(links)));
    }

    if labelled == 0 {
        let text = item.text()?;
        let text = text.trim();
        if !text.is_empty() {
            raw.push((fields::CONTEUDO.to_owned(), FieldValue::from(text)));
        }
    }

    if raw.is_empty() {
        return Ok(None);
    }
    Ok(Some(normalize_fields(raw)))
}

fn full_text_record<E: Element>(item: &E) -> Option<CaseRecord> {
    match item.text() {
        Ok(text) if !text.trim().is_empty() => Some(normalize_fields([(
            fields::CONTEUDO.to_owned(),
            FieldValue::from(text.trim()),
        )])),
        Ok(_) => None,
        Err(e) => {
            log::debug!("Full-text fallback failed too: {e}");
            None
        }
    }
}

fn read_container_text<E: Element>(container: &E, ctx: &StrategyContext<'_>) -> ExtractionOutcome {
    log::info!("No result items found, reading the results container as text");
    match container.text() {
        Ok(text) => ExtractionOutcome::from_records(normalize_blob(text.trim(), ctx.total)),
        Err(e) => {
            log::warn!("Could not read the results container: {e}");
            ExtractionOutcome::NoMatch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractConfig;
    use crate::fake::{FakeElement, FakePage};
    use crate::html::HtmlPage;

    const CONTAINER: &str = "ctl00_ContentPlaceHolder1_divResultados";

    fn attempt<P: Page>(page: &P) -> Vec<CaseRecord> {
        let config = ExtractConfig::default();
        ListStrategy
            .attempt(page, &StrategyContext::new(&config, Some(3)))
            .into_records()
    }

    #[test]
    fn reads_labelled_spans_and_links() {
        let page = HtmlPage::parse(format!(
            "<body><div id='{CONTAINER}'>\
             <div class='resultadocdital'>\
               <span id='rpt_lblTribunal_0'>Comarca de Braga</span>\
               <span id='rpt_lblProcesso_0'> 55/25.1T8BRG </span>\
               <span id='rpt_lblTexto_0'>Sentença de insolvência</span>\
               <span id='rpt_lblNIF_0'>503504564</span>\
               <a href='https://www.citius.mj.pt/doc?id=9'>PDF</a>\
             </div></div></body>"
        ));
        let records = attempt(&page);

        assert_eq!(
            records,
            vec![
                CaseRecord::new()
                    .with(fields::TRIBUNAL, "Comarca de Braga")
                    .with(fields::PROCESSO, "55/25.1T8BRG")
                    .with(fields::DESCRICAO, "Sentença de insolvência")
                    .with(fields::NIF_NIPC, "503504564")
                    .with(fields::LINKS, vec!["https://www.citius.mj.pt/doc?id=9".to_owned()])
            ]
        );
    }

    #[test]
    fn unlabelled_item_keeps_full_text() {
        let page = HtmlPage::parse(format!(
            "<body><div id='{CONTAINER}'>\
             <div class='resultado'>Anúncio sem campos<br>ver documento</div>\
             </div></body>"
        ));
        assert_eq!(
            attempt(&page),
            vec![CaseRecord::new().with(fields::CONTEUDO, "Anúncio sem campos\nver documento")]
        );
    }

    #[test]
    fn unlabelled_item_with_labels_in_text_is_restructured() {
        let page = HtmlPage::parse(format!(
            "<body><div id='{CONTAINER}'>\
             <div class='resultado'>Tribunal: Évora<br>Processo: 8/25</div>\
             </div></body>"
        ));
        assert_eq!(
            attempt(&page),
            vec![
                CaseRecord::new()
                    .with(fields::TRIBUNAL, "Évora")
                    .with(fields::PROCESSO, "8/25")
            ]
        );
    }

    #[test]
    fn fallback_selector_matches_item_ids_but_not_container() {
        let page = HtmlPage::parse(format!(
            "<body><div id='{CONTAINER}'>\
             <div id='divResultado1'><span id='lblTribunal1'>Aveiro</span></div>\
             <div id='divResultado2'><span id='lblTribunal2'>Viseu</span></div>\
             </div></body>"
        ));
        let tribunals: Vec<_> = attempt(&page)
            .iter()
            .filter_map(|r| r.get(fields::TRIBUNAL).cloned())
            .collect();
        assert_eq!(tribunals, vec![FieldValue::from("Aveiro"), FieldValue::from("Viseu")]);
    }

    #[test]
    fn nested_selector_is_scoped_to_container() {
        let config = ExtractConfig {
            item_fallback_selector: ".resultado".to_owned(),
            nested_item_selector: "div.caso".to_owned(),
            ..ExtractConfig::default()
        };
        let page = HtmlPage::parse(format!(
            "<body><div class='caso'><span id='lblTribunal0'>Fora</span></div>\
             <div id='{CONTAINER}'>\
             <div class='caso'><span id='lblTribunal1'>Dentro</span></div>\
             </div></body>"
        ));
        let records = ListStrategy
            .attempt(&page, &StrategyContext::new(&config, None))
            .into_records();
        assert_eq!(records, vec![CaseRecord::new().with(fields::TRIBUNAL, "Dentro")]);
    }

    #[test]
    fn container_without_items_is_read_as_text() {
        let page = HtmlPage::parse(format!(
            "<body><div id='{CONTAINER}'>\
             <p>2 documentos encontrados</p>\
             <p>Tribunal: Lisboa</p><p>Processo: 1/24</p>\
             <p>Tribunal: Porto</p><p>Processo: 2/24</p>\
             </div></body>"
        ));
        let records = attempt(&page);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get(fields::PROCESSO), Some(&FieldValue::from("2/24")));
    }

    #[test]
    fn expired_budget_reads_no_items() {
        let page = HtmlPage::parse(format!(
            "<body><div id='{CONTAINER}'>\
             <div class='resultado'><span id='lblTribunal1'>Aveiro</span></div>\
             <div class='resultado'><span id='lblTribunal2'>Viseu</span></div>\
             </div></body>"
        ));
        let config = ExtractConfig::default().with_budget_secs(0);
        assert_eq!(
            ListStrategy.attempt(&page, &StrategyContext::new(&config, Some(2))),
            ExtractionOutcome::NoMatch
        );
    }

    #[test]
    fn missing_container_is_no_match() {
        let page = HtmlPage::parse("<body><div class='resultado'>Tribunal: X</div></body>");
        assert!(attempt(&page).is_empty());
    }

    #[test]
    fn stale_item_is_skipped_and_broken_item_falls_back_to_text() {
        let config = ExtractConfig::default();
        let page = FakePage::new("")
            .element(&format!("#{CONTAINER}"), FakeElement::new(""))
            .element(&config.item_selector, FakeElement::stale())
            .element(&config.item_selector, FakeElement::broken("Texto do anúncio"))
            .element(
                &config.item_selector,
                FakeElement::new("").child(ITEM_FIELDS[0].1, FakeElement::new("Leiria")),
            );

        assert_eq!(
            attempt(&page),
            vec![
                CaseRecord::new().with(fields::CONTEUDO, "Texto do anúncio"),
                CaseRecord::new().with(fields::TRIBUNAL, "Leiria"),
            ]
        );
    }
}
