//! Static browsing site generation.
//!
//! The site is a thin collaborator over the JSON artifacts: the home page is
//! a static shell whose grid, search box, and date filtering are driven
//! client-side by `static/app.js` against `data/items.json`; the archive
//! pages are fully rendered from the partitioned groups, one page per
//! `YYYY-MM` (or `unknown`) key. All pages are overwritten on every run.

use crate::models::NewsItem;
use crate::pipeline::UNKNOWN_GROUP;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Write;
use tokio::fs;
use tracing::{info, instrument};

const STYLES_CSS: &str = r#"*{box-sizing:border-box}
body{font-family:system-ui,Arial,Segoe UI,Roboto,sans-serif;margin:0;background:#f8f9fa;color:#212529}
.wrap{max-width:1140px;margin:0 auto;padding:18px}
.mast{display:flex;justify-content:space-between;align-items:center;gap:12px;margin-bottom:10px}
.brand h1{font-size:1.3rem;margin:0}
.tag{color:#6c757d;font-size:.95rem}
.link{color:#0d6efd;text-decoration:none}.link:hover{text-decoration:underline}
.filters{background:#fff;border:1px solid #dee2e6;border-radius:12px;padding:12px;margin-bottom:10px}
.filter-grid{display:grid;gap:8px;grid-template-columns:1fr 200px 200px 120px}
@media(max-width:760px){.filter-grid{grid-template-columns:1fr}}
input[type=search],input[type=date]{width:100%;padding:10px;border-radius:10px;border:1px solid #dee2e6;background:#fff;color:#212529}
.btn{padding:10px 12px;border-radius:10px;border:1px solid #dee2e6;background:#e9ecef;cursor:pointer}
.btn:hover{background:#dee2e6}
.grid{display:grid;gap:14px}
@media(min-width:720px){.grid{grid-template-columns:1fr 1fr}}
.card{background:#fff;border:1px solid #dee2e6;border-radius:12px;overflow:hidden}
.inner{display:grid;gap:12px;grid-template-columns:1fr 220px}
@media(max-width:719px){.inner{grid-template-columns:1fr}}
.txt{padding:14px}
.thumb{width:100%;height:100%;object-fit:cover;background:#f1f3f5}
.muted{color:#6c757d;font-size:.9em}
.empty{padding:18px;text-align:center;color:#6c757d}
.media{width:100%;height:100%;background:#f1f3f5;border-left:1px solid #dee2e6;display:flex;align-items:center;justify-content:center;padding:12px}
.media__inner{max-height:100%;overflow:hidden;text-align:left}
.media__title{font-weight:600;line-height:1.25;margin:0 0 6px 0;font-size:14px;color:#212529}
.media__summary{color:#6c757d;font-size:13px;line-height:1.35}
"#;

const APP_JS: &str = r#"(async function(){
  const grid = document.getElementById('grid');
  const empty = document.getElementById('empty');
  const q = document.getElementById('q');
  const count = document.getElementById('count');
  const dateStartEl = document.getElementById('dateStart');
  const dateEndEl   = document.getElementById('dateEnd');
  const clearDates  = document.getElementById('clearDates');

  let all = [];
  try{
    const res = await fetch('./data/items.json?cb=' + Date.now(), {cache:'no-store'});
    if(!res.ok) throw new Error('HTTP ' + res.status);
    all = await res.json();
  }catch(e){
    empty.style.display = '';
    count.textContent = '0 results';
    console.error('Failed to fetch items.json', e);
    return;
  }
  if(!Array.isArray(all) || all.length===0){
    empty.style.display='';
    count.textContent = '0 results';
    return;
  }

  all = all.map(i => ({ ...i, _dateOnly: (i.date||'').slice(0,10) }));

  function withinDate(i){
    const ds = dateStartEl?.value || null;
    const de = dateEndEl?.value || null;
    if (ds && i._dateOnly < ds) return false;
    if (de && i._dateOnly > de) return false;
    return true;
  }
  function anyFiltersActive(){
    return !!(q?.value||'').trim() || !!(dateStartEl?.value) || !!(dateEndEl?.value);
  }
  function filterAll(){
    const term=(q?.value||'').toLowerCase();
    return all.filter(i=>{
      const termOk = !term || ((i.title||'').toLowerCase().includes(term) || (i.summary||'').toLowerCase().includes(term));
      return termOk && withinDate(i);
    });
  }
  function cardHTML(i){
    const img = i.image ? `<img class="thumb" loading="lazy" src="${i.image}" alt="">`
                         : `<div class="media"><div class="media__inner">
                              <div class="media__title">${(i.title||'').slice(0,120)}</div>
                              <div class="media__summary">${(i.summary||'No summary available.').slice(0,180)}</div>
                            </div></div>`;
    return `<div class="card">
      <div class="inner">
        <div class="txt">
          <h3 style="margin:.4rem 0"><a target="_blank" href="${i.link}">${i.title}</a></h3>
          <div class="muted">${i.date||''} • ${i.source||''}</div>
          <p>${i.summary||''}</p>
        </div>
        <div>${img}</div>
      </div>
    </div>`;
  }
  function render(list){
    const limit = anyFiltersActive() ? list.length : 25;
    const limited = list.slice(0, limit);
    grid.innerHTML = limited.map(cardHTML).join('');
    count.textContent = anyFiltersActive()
      ? `${limited.length} results (all matches shown)`
      : `${limited.length}/${list.length} shown • ${all.length} total`;
    empty.style.display = limited.length ? 'none' : '';
  }
  function refresh(){ render(filterAll()); }

  let t=null;
  if (q) q.addEventListener('input', ()=>{ clearTimeout(t); t=setTimeout(refresh, 160); });
  [dateStartEl, dateEndEl].forEach(el => el?.addEventListener('change', refresh));
  clearDates?.addEventListener('click', ()=>{ if(dateStartEl) dateStartEl.value=''; if(dateEndEl) dateEndEl.value=''; refresh(); });

  refresh();
})();
"#;

const HOME_SHELL: &str = r#"<!doctype html>
<meta charset="utf-8">
<title>Breakthrough Beat — Global Science & Health News</title>
<meta name="viewport" content="width=device-width, initial-scale=1">
<link rel="stylesheet" href="./static/styles.css">
<div class="wrap">
  <header class="mast">
    <div class="brand">
      <h1>Breakthrough Beat</h1>
      <div class="tag">Global Science &amp; Health News</div>
    </div>
    <nav class="nav">
      <a class="link" href="./archive/index.html">Archive →</a>
      <a class="link" href="./data/items.json" target="_blank" rel="noopener">JSON</a>
    </nav>
  </header>

  <details class="filters">
    <summary>Show Search Filter</summary>
    <div class="filter-grid">
      <input id="q" type="search" placeholder="Search title or summary…">
      <label>Date start <input id="dateStart" type="date"></label>
      <label>Date end <input id="dateEnd" type="date"></label>
      <button id="clearDates" class="btn">Clear dates</button>
    </div>
  </details>

  <div id="count" class="muted"></div>
  <div id="grid" class="grid"></div>
  <div id="empty" class="empty" style="display:none">No results.</div>
</div>
<script src="./static/app.js"></script>
"#;

/// Write the static assets, the `.nojekyll` marker, and the home shell.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_shell(output_dir: &str) -> Result<(), Box<dyn Error>> {
    let static_dir = format!("{output_dir}/static");
    fs::create_dir_all(&static_dir).await?;

    fs::write(format!("{output_dir}/.nojekyll"), "").await?;
    fs::write(format!("{static_dir}/styles.css"), STYLES_CSS).await?;
    fs::write(format!("{static_dir}/app.js"), APP_JS).await?;
    fs::write(format!("{output_dir}/index.html"), HOME_SHELL).await?;
    info!("Wrote home shell and static assets");
    Ok(())
}

/// Render one item card for an archive page.
fn card_html(item: &NewsItem) -> String {
    let media = match &item.image {
        Some(image) => format!("<img class='thumb' loading='lazy' src='{image}' alt=''>"),
        None => {
            let title: String = item.title.chars().take(120).collect();
            let fallback = if item.summary.is_empty() {
                "No summary available."
            } else {
                &item.summary
            };
            let fallback: String = fallback.chars().take(180).collect();
            format!(
                "<div class='media'><div class='media__inner'><div class='media__title'>{title}</div><div class='media__summary'>{fallback}</div></div></div>"
            )
        }
    };
    format!(
        "<div class='card'><div class='inner'><div class='txt'><h3 style='margin:.4rem 0'><a target='_blank' href='{link}'>{title}</a></h3><div class='muted'>{date} • {source}</div><p>{summary}</p></div><div>{media}</div></div></div>",
        link = item.link,
        title = item.title,
        date = item.date,
        source = item.source,
        summary = item.summary,
    )
}

fn archive_page(key: &str, items: &[NewsItem]) -> String {
    let mut page = String::new();
    write!(
        page,
        "<!doctype html><meta charset='utf-8'><title>Archive — {key}</title>\
         <link rel='stylesheet' href='../static/styles.css'>\
         <div class='wrap'><h1>Archive — {key}</h1><a class='link' href='../index.html'>← Home</a>\
         <div class='grid'>"
    )
    .unwrap();
    for item in items {
        page.push_str(&card_html(item));
    }
    page.push_str("</div></div>");
    page
}

fn archive_index(groups: &BTreeMap<String, Vec<NewsItem>>) -> String {
    let mut page = String::new();
    page.push_str(
        "<!doctype html><meta charset='utf-8'><title>Archive</title>\
         <link rel='stylesheet' href='../static/styles.css'>\
         <div class='wrap'><h1>Archive</h1><a class='link' href='../index.html'>← Home</a><ul>",
    );
    // BTreeMap order is oldest month first; list newest first, with the
    // unknown bucket (which sorts after every month key) at the end.
    let months = groups.iter().rev().filter(|(key, _)| *key != UNKNOWN_GROUP);
    let unknown = groups.get_key_value(UNKNOWN_GROUP);
    for (key, items) in months.chain(unknown) {
        writeln!(
            page,
            "<li><a class='link' href='./{key}.html'>{key}</a> <span class='muted'>({} items)</span></li>",
            items.len()
        )
        .unwrap();
    }
    page.push_str("</ul></div>");
    page
}

/// Write the archive landing page and one browsing page per group.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir, groups = groups.len()))]
pub async fn write_archive_pages(
    groups: &BTreeMap<String, Vec<NewsItem>>,
    output_dir: &str,
) -> Result<(), Box<dyn Error>> {
    let archive_dir = format!("{output_dir}/archive");
    fs::create_dir_all(&archive_dir).await?;

    fs::write(format!("{archive_dir}/index.html"), archive_index(groups)).await?;

    for (key, items) in groups {
        let path = format!("{archive_dir}/{key}.html");
        fs::write(&path, archive_page(key, items)).await?;
        info!(path = %path, count = items.len(), "Wrote archive page");
    }
    Ok(())
}
