//! Long-form help printed by `--man`.

pub const MANUAL: &str = "\
CITIUS - insolvency publicity search scraper

Searches the Citius portal (https://www.citius.mj.pt) for insolvency
publications by NIF/NIPC or entity name and exports every case found to
<output>.csv and <output>.json.

USAGE:
    citius (--nif <NIF> | --designacao <NAME>) [OPTIONS]
    citius --from-html <FILE> [--output <BASE>]

SEARCH:
    --nif <NIF>              NIF/NIPC of the entity
    --designacao <NAME>      Entity name
    --data-inicio <DATE>     First publication date (DD-MM-YYYY)
    --data-fim <DATE>        Last publication date (DD-MM-YYYY)
    --tribunal <SET>         'nova' (current courts) or 'extintos' (abolished courts)
    --grupo-actos <LABEL>    Act group, as shown in the dropdown
    --acto <LABEL>           Specific act, as shown in the dropdown
    --dias <WINDOW>          15 | 30 | todos (default: todos)

OUTPUT:
    --output <BASE>          Output file name without extension
                             (default: resultados_citius)
    --from-html <FILE>       Re-extract a saved results page, such as
                             debug_results_page.html, without a browser

BROWSER:
    --headless               Run Chrome without a window
    --timeout <SECS>         Wait limit for page loads and elements (default: 60)
    --config <FILE>          Portal configuration (TOML); CITIUS_CONFIG is
                             used when this flag is absent

OTHER:
    --debug                  Verbose logging (RUST_LOG is honoured otherwise)
    --man                    Show this manual and exit
    -h, --help               Short help

RESULTS:
    Each case becomes one record. Cases are read from the results table,
    the results list or, failing both, from the page text. When the portal
    reports documents that cannot be read, one placeholder record per
    document is written instead. Creditors and links are joined with '; '
    in the CSV file and kept as lists in the JSON file.

EXIT STATUS:
    0   search completed, including searches with no results
    1   invalid arguments, or a fatal error (an error report is written to
        <output>.csv and <output>.json)

EXAMPLES:
    citius --nif 503504564
    citius --designacao \"Empresa XYZ\" --data-inicio 01-01-2025 --data-fim 31-01-2025
    citius --from-html debug_results_page.html --output reextraido

Respect the Citius portal terms of use.
";
