use std::time::Duration;
use std::time::SystemTime;

use rstest::rstest;
use serde_json::Value;
use serde_json::json;
use similar_asserts::assert_eq;
use tracing_test::traced_test;

use super::__fixtures::*;
use super::*;
use crate::value::Arithmetic;
use crate::value::Key;

#[rstest]
#[case::with_markers(
	"<html><!-- tmplblock: begin --><p>inner</p><!-- tmplblock: end --></html>",
	"<p>inner</p>"
)]
#[case::compact_markers("a<!--tmplblock:begin-->b<!--tmplblock:end-->c", "b")]
#[case::without_markers("<p>whole</p>", "<p>whole</p>")]
#[case::begin_without_end("<!-- tmplblock: begin -->open", "<!-- tmplblock: begin -->open")]
fn extracts_the_block(#[case] source: &str, #[case] expected: &str) {
	let site = Site::new();
	assert_eq!(render(&site, "page.html", source), expected);
}

#[test]
fn includes_render_in_place() -> KstyleResult<()> {
	let site = Site::new();
	site.template("nav.html", "<!-- tmplblock: begin --><nav>{$title}</nav><!-- tmplblock: end -->");
	site.template("page.html", "<body>{tmplinclude: nav.html}<main/></body>");

	let mut templates = site.engine();
	templates.assign([("title", json!("Home"))], false);
	let html = templates.render_to_string("page.html")?;
	insta::assert_snapshot!(html, @"<body><nav>Home</nav><main/></body>");

	Ok(())
}

#[rstest]
#[case::in_order("1{tmplinclude: header.html}2{tmplinclude: footer.html}3", "1H2F3")]
#[case::repeated("1{tmplinclude: header.html}2{tmplinclude: footer.html}3{tmplinclude: header.html}", "1H2F3H")]
#[case::adjacent("{tmplinclude: footer.html}{tmplinclude: header.html}", "FH")]
fn includes_resolve_in_order(#[case] source: &str, #[case] expected: &str) -> KstyleResult<()> {
	let site = Site::new();
	site.template("header.html", "H");
	site.template("footer.html", "F");
	assert_eq!(render(&site, "page.html", source), expected);

	Ok(())
}

#[test]
fn included_templates_declare_functions() -> KstyleResult<()> {
	let site = Site::new();
	site.template(
		"helpers.html",
		"<!-- tmplphp: ##static_begin## function shout($text) { return strtoupper($text) . '!'; } ##static_end## -->",
	);
	site.template(
		"page.html",
		"{tmplinclude: helpers.html}<!-- tmplphp: echo shout('hi'); -->",
	);

	let mut templates = site.engine();
	assert_eq!(templates.render_to_string("page.html")?, "HI!");
	assert_eq!(templates.render_to_string("page.html")?, "HI!");

	Ok(())
}

#[test]
fn conflicting_functions_across_templates_fail() {
	let site = Site::new();
	site.template("one.html", "<!-- tmplphp: function pick() { return 1; } -->");
	site.template(
		"page.html",
		"{tmplinclude: one.html}<!-- tmplphp: function pick() { return 2; } echo pick(); -->",
	);

	let mut templates = site.engine();
	let error = templates.render_to_string("page.html").unwrap_err();
	assert_eq!(error.to_string(), "runtime error: Cannot redeclare pick()");
	assert_eq!(templates.errors()["output"].len(), 1);
}

#[test]
fn include_targets_are_trimmed() -> KstyleResult<()> {
	let compiler = Compiler::new("/templates/default/")?;
	let pieces = compiler.compile_pieces("page.html", "a{ tmplinclude:  b.html }c{tmplinclude: }")?;

	assert_eq!(
		pieces,
		vec![
			Piece::Markup("a".into()),
			Piece::Directive(Directive::Include {
				target: "b.html".into(),
			}),
			Piece::Markup("c{tmplinclude: }".into()),
		]
	);

	Ok(())
}

#[test]
fn recursive_includes_hit_the_depth_limit() {
	let site = Site::new();
	site.template("loop.html", "x{tmplinclude: loop.html}");

	let mut templates = site.engine();
	let error = templates.render_to_string("loop.html").unwrap_err();
	assert!(matches!(error, KstyleError::IncludeDepth { .. }));
	assert_eq!(templates.errors()["output"].len(), 1);
}

#[rstest]
#[case::stylesheet(
	r#"<link rel="stylesheet" href="css/site.css">"#,
	r#"<link rel="stylesheet" href="/templates/default/css/site.css">"#
)]
#[case::stylesheet_query(
	r#"<link href='print.css?v=1.2' media="print">"#,
	r#"<link href='/templates/default/print.css?v=1.2' media="print">"#
)]
#[case::image(r#"<img alt="v1.2" src="img/logo.png">"#, r#"<img alt="v1.2" src="/templates/default/img/logo.png">"#)]
#[case::background_attribute(r#"<td background="bg.gif">"#, r#"<td background="/templates/default/bg.gif">"#)]
#[case::background_image(
	r#"<div style="background-image: url('bg.png')">"#,
	r#"<div style="background-image: url('/templates/default/bg.png')">"#
)]
#[case::script(r#"<script src="app.js"></script>"#, r#"<script src="/templates/default/app.js"></script>"#)]
#[case::absolute_url(r#"<img src="https://cdn.example.com/a.png">"#, r#"<img src="https://cdn.example.com/a.png">"#)]
#[case::root_relative(r#"<script src="/js/app.js"></script>"#, r#"<script src="/js/app.js"></script>"#)]
#[case::interpolated(r#"<img src="{$logo}">"#, r#"<img src="{$logo}">"#)]
#[case::not_a_stylesheet(r#"<a href="page.html">"#, r#"<a href="page.html">"#)]
fn rewrites_relative_assets(#[case] input: &str, #[case] expected: &str) -> KstyleResult<()> {
	let assets = AssetRewriter::new("/templates/default/")?;
	let rewritten = assets.rewrite(input);
	assert_eq!(rewritten, expected);
	assert_eq!(assets.rewrite(&rewritten), rewritten);

	Ok(())
}

#[test]
fn asset_prefix_follows_the_configured_paths() -> KstyleResult<()> {
	let site = Site::new();
	let config = site.config().with_site_path("/shop/").with_web_path("skins", "blue");
	assert_eq!(config.style_path(), "/shop/skins/blue");
	assert_eq!(config.asset_prefix(), "/shop/skins/blue/");

	site.template("page.html", r#"<img src="logo.png">"#);
	let mut templates = Templates::new(config)?;
	assert_eq!(templates.style_path(), "/shop/skins/blue");
	assert_eq!(
		templates.render_to_string("page.html")?,
		r#"<img src="/shop/skins/blue/logo.png">"#
	);

	Ok(())
}

#[test]
fn empty_web_paths_give_the_root() {
	let config = StyleConfig::new("style", "cache").with_web_path("", "");
	assert_eq!(config.style_path(), "/");
	assert_eq!(config.asset_prefix(), "/");
}

#[rstest]
#[case::scalar("<p>{$name}</p>", "<p>Ada</p>")]
#[case::quoted_key("{$user['name']}", "Lovelace")]
#[case::double_quoted_key(r#"{$user["name"]}"#, "Lovelace")]
#[case::bare_key("{$user[name]}", "Lovelace")]
#[case::nested("{$user['langs'][1]}", "rust")]
#[case::variable_key("{$rows[$index]['title']}", "second")]
#[case::missing("[{$nothing}]", "[]")]
#[case::number("{$count}", "3")]
#[case::float("{$ratio}", "0.5")]
#[case::boolean("{$enabled}|{$disabled}", "1|")]
#[case::not_a_reference("{$ name} {name}", "{$ name} {name}")]
fn interpolates_variables(#[case] source: &str, #[case] expected: &str) -> KstyleResult<()> {
	let site = Site::new();
	site.template("page.html", source);

	let mut templates = site.engine();
	templates.assign_json(
		json!({
			"name": "Ada",
			"user": { "name": "Lovelace", "langs": ["ocaml", "rust"] },
			"rows": [{ "title": "first" }, { "title": "second" }],
			"index": 1,
			"count": 3,
			"ratio": 0.5,
			"enabled": true,
			"disabled": false,
		}),
		false,
	)?;
	assert_eq!(templates.render_to_string("page.html")?, expected);

	Ok(())
}

#[test]
fn lists_variable_names_from_markup() -> KstyleResult<()> {
	let site = Site::new();
	site.template(
		"page.html",
		"{$b} {$a['x']} {$b[$c]} <!-- tmplphp: echo \"{$hidden}\"; --> <i tmpltag=%#echo $tag;#%>",
	);

	let mut templates = site.engine();
	assert_eq!(templates.list_variable_names("page.html")?, vec!["a", "b"]);

	Ok(())
}

#[test]
fn merge_is_idempotent() {
	let mut store = VariableStore::new();
	store.assign([("user", json!({ "name": "Ada", "tags": ["a"] }))], false);

	let incoming = json!({ "user": { "tags": ["a", "b"], "role": "admin" } });
	store.assign_json(incoming.clone(), true).unwrap();
	let once = store.clone();
	store.assign_json(incoming, true).unwrap();

	assert_eq!(store, once);
	assert_eq!(
		store.get("user"),
		Some(&json!({ "name": "Ada", "tags": ["a", "b"], "role": "admin" }))
	);
}

#[test]
fn merge_keeps_sibling_keys() {
	let mut store = VariableStore::new();
	store.assign_json(json!({ "a": { "x": 1 } }), true).unwrap();
	store.assign_json(json!({ "a": { "y": 2 } }), true).unwrap();
	store.assign_json(json!({ "a": { "x": 3 } }), true).unwrap();

	assert_eq!(store.get("a"), Some(&json!({ "x": 3, "y": 2 })));
}

#[test]
fn assign_without_merge_replaces() {
	let mut store = VariableStore::new();
	store.assign([("list", json!([1, 2]))], false);
	store.assign([("list", json!([3]))], false);
	assert_eq!(store.get("list"), Some(&json!([3])));

	store.assign([("list", json!("scalar"))], true);
	assert_eq!(store.get("list"), Some(&json!("scalar")));
}

#[test]
fn assigning_a_non_mapping_is_reported() {
	let site = Site::new();
	let mut templates = site.engine();

	let error = templates.assign_json(json!([1, 2]), false).unwrap_err();
	assert!(matches!(error, KstyleError::NotAMapping));
	assert_eq!(templates.errors()["assign"].len(), 1);
	assert!(templates.variables().is_empty());
}

#[test]
fn reuses_fresh_artifacts() -> KstyleResult<()> {
	let site = Site::new();
	let source = site.template("page.html", "<p>{$title}</p>");
	let mut templates = site.engine();

	assert_eq!(templates.prepare("page.html")?, CacheStatus::Compiled);
	let compiled = std::fs::read(site.artifact("page.html"))?;
	assert_eq!(templates.prepare("page.html")?, CacheStatus::Fresh);
	assert_eq!(std::fs::read(site.artifact("page.html"))?, compiled);

	set_modified(&source, SystemTime::now() + Duration::from_secs(100));
	assert_eq!(templates.prepare("page.html")?, CacheStatus::Compiled);

	Ok(())
}

#[test]
fn debug_mode_always_recompiles() -> KstyleResult<()> {
	let site = Site::new();
	site.template("page.html", "static");
	let mut templates = site.debug_engine();

	assert_eq!(templates.prepare("page.html")?, CacheStatus::Compiled);
	assert_eq!(templates.prepare("page.html")?, CacheStatus::Compiled);
	assert_eq!(CacheStatus::Compiled.as_str(), "compiled");

	Ok(())
}

#[test]
fn artifacts_in_subdirectories() -> KstyleResult<()> {
	let site = Site::new();
	site.template("mail/welcome.html", "hi");
	let mut templates = site.engine();

	assert_eq!(templates.render_to_string("mail/welcome.html")?, "hi");
	assert!(site.artifact("mail/welcome.html").is_file());

	Ok(())
}

#[test]
#[traced_test]
fn recovers_from_a_corrupt_artifact() -> KstyleResult<()> {
	let site = Site::new();
	site.template("page.html", "ok");
	std::fs::write(site.artifact("page.html"), "{ not json")?;

	let mut templates = site.engine();
	assert_eq!(templates.prepare("page.html")?, CacheStatus::Compiled);
	assert_eq!(templates.render_to_string("page.html")?, "ok");
	assert!(logs_contain("discarding unreadable artifact"));
	assert!(logs_contain("compiling template"));

	let cached = artifact_cache::load(&site.artifact("page.html"));
	assert_eq!(cached.map(|artifact| artifact.schema_version), Some(ARTIFACT_SCHEMA_VERSION));

	Ok(())
}

#[test]
fn ignores_artifacts_from_another_schema() -> KstyleResult<()> {
	let site = Site::new();
	site.template("page.html", "new");

	let mut stale = Artifact::new("page.html");
	stale.schema_version = ARTIFACT_SCHEMA_VERSION + 1;
	stale.body = vec![Stmt::Text("old".into())];
	std::fs::write(site.artifact("page.html"), serde_json::to_vec(&stale).unwrap())?;

	let mut templates = site.engine();
	assert_eq!(templates.render_to_string("page.html")?, "new");

	Ok(())
}

#[rstest]
#[case::for_loop(
	"<ul><!-- tmplphp: for ($i = 0; $i < 3; $i++) { --><li>{$i}</li><!-- tmplphp: } --></ul>",
	"<ul><li>0</li><li>1</li><li>2</li></ul>"
)]
#[case::foreach_alt(
	"<!-- tmplphp: foreach ($items as $key => $item): -->[{$key}={$item}]<!-- tmplphp: endforeach; -->",
	"[0=a][1=b]"
)]
#[case::if_else(
	"<!-- tmplphp: if (count($items) > 2) { -->many<!-- tmplphp: } else { -->few<!-- tmplphp: } -->",
	"few"
)]
#[case::if_alt(
	"<!-- tmplphp: if ($n == 1): -->one<!-- tmplphp: elseif ($n == 2): -->two<!-- tmplphp: else: -->other<!-- tmplphp: endif; -->",
	"two"
)]
#[case::while_loop("<!-- tmplphp: $k = 3; while ($k > 0) { echo $k--; } -->", "321")]
#[case::break_continue(
	"<!-- tmplphp: foreach (range(1, 6) as $v) { if ($v == 2) continue; if ($v > 4) break; echo $v; } -->",
	"134"
)]
#[case::string_interpolation(r#"<!-- tmplphp: echo "Hi $name, {$user['name']}!"; -->"#, "Hi Ada, Lovelace!")]
#[case::single_quotes(r"<!-- tmplphp: echo 'no $name\n'; -->", r"no $name\n")]
#[case::concat("<!-- tmplphp: echo $name . ' ' . strtoupper($user['name']); -->", "Ada LOVELACE")]
#[case::ternary("<!-- tmplphp: echo $n > 1 ? 'yes' : 'no'; -->", "yes")]
#[case::builtins(
	"<!-- tmplphp: echo implode(', ', $items), '|', number_format(1234.5, 2), '|', substr('hello', -3); -->",
	"a, b|1,234.50|llo"
)]
#[case::arithmetic("<!-- tmplphp: echo 7 / 2, ' ', 6 / 2, ' ', '3' + 4, ' ', 0.1 + 0.2; -->", "3.5 3 7 0.3")]
#[case::comments("<!-- tmplphp: // line\n /* block */ echo 'x'; -->", "x")]
#[case::early_return("a<!-- tmplphp: return; -->b", "a")]
#[case::substr_past_the_end("<!-- tmplphp: echo substr('abc', 1, 9223372036854775807); -->", "bc")]
#[case::largest_array_key(
	"<!-- tmplphp: $a = [9223372036854775807 => 'x', 'y']; echo count($a), $a[9223372036854775807]; -->",
	"1y"
)]
fn runs_embedded_code(#[case] source: &str, #[case] expected: &str) -> KstyleResult<()> {
	let site = Site::new();
	site.template("page.html", source);

	let mut templates = site.engine();
	templates.assign_json(
		json!({
			"name": "Ada",
			"user": { "name": "Lovelace" },
			"items": ["a", "b"],
			"n": 2,
		}),
		false,
	)?;
	assert_eq!(templates.render_to_string("page.html")?, expected);

	Ok(())
}

#[test]
fn embedded_code_writes_to_the_store() -> KstyleResult<()> {
	let site = Site::new();
	site.template("page.html", "<!-- tmplphp: $seen['page'] = 'home'; $total += 5; -->");

	let mut templates = site.engine();
	templates.assign([("total", json!(1))], false);
	templates.render_to_string("page.html")?;

	assert_eq!(templates.variables().get("seen"), Some(&json!({ "page": "home" })));
	assert_eq!(templates.variables().get("total"), Some(&json!(6)));

	Ok(())
}

#[test]
fn static_regions_define_functions() -> KstyleResult<()> {
	let site = Site::new();
	site.template(
		"page.html",
		"<!-- tmplphp: ##static_begin## function sum($a, $b = 10) { $tmp = $a + $b; return $tmp; } \
		 ##static_end## echo sum(2, 3), '/', SUM(1); -->{$tmp}",
	);

	let mut templates = site.engine();
	assert_eq!(templates.render_to_string("page.html")?, "5/11");
	assert_eq!(templates.variables().get("tmp"), None);

	Ok(())
}

#[test]
fn redeclared_functions_fail_to_compile() {
	let site = Site::new();
	site.template(
		"page.html",
		"<!-- tmplphp: function f() { return 1; } function F() { return 2; } -->",
	);

	let mut templates = site.engine();
	let error = templates.render_to_string("page.html").unwrap_err();
	assert!(matches!(error, KstyleError::CodeSyntax { .. }));
	assert_eq!(templates.errors()["compile"].len(), 1);
}

#[test]
fn undefined_functions_fail_at_runtime() {
	let site = Site::new();
	site.template("page.html", "before<!-- tmplphp: nope(); -->");

	let mut templates = site.engine();
	let error = templates.render_to_string("page.html").unwrap_err();
	assert_eq!(error.to_string(), "runtime error: Call to undefined function nope()");
}

#[rstest]
#[case::checked(true, r#"<input type="checkbox" checked>"#)]
#[case::unchecked(false, r#"<input type="checkbox" >"#)]
fn runs_tag_code(#[case] checked: bool, #[case] expected: &str) -> KstyleResult<()> {
	let site = Site::new();
	site.template(
		"page.html",
		r#"<input type="checkbox" tmpltag=x#if ($checked) echo "checked";#x>"#,
	);

	let mut templates = site.engine();
	templates.assign([("checked", Value::Bool(checked))], false);
	assert_eq!(templates.render_to_string("page.html")?, expected);

	Ok(())
}

#[rstest]
#[case::open_branch(
	true,
	r##"<div tmpltag="#if ($show) {#">in</div><p tmpltag="#}#">after</p>"##,
	"<div >in</div><p >after</p>"
)]
#[case::skipped_branch(
	false,
	r##"<div tmpltag="#if ($show) {#">in</div><p tmpltag="#}#">after</p>"##,
	"<div >after</p>"
)]
#[case::then_branch(
	true,
	r##"<div tmpltag="#if ($show) {#">in</div><div tmpltag="#} else {#">out</div><p tmpltag="#}#">after</p>"##,
	"<div >in</div><div >after</p>"
)]
#[case::else_branch(
	false,
	r##"<div tmpltag="#if ($show) {#">in</div><div tmpltag="#} else {#">out</div><p tmpltag="#}#">after</p>"##,
	"<div >out</div><p >after</p>"
)]
fn tag_code_spans_several_tags(
	#[case] show: bool,
	#[case] source: &str,
	#[case] expected: &str,
) -> KstyleResult<()> {
	let site = Site::new();
	site.template("page.html", source);

	let mut templates = site.engine();
	templates.assign([("show", Value::Bool(show))], false);
	assert_eq!(templates.render_to_string("page.html")?, expected);

	Ok(())
}

#[test]
fn unclosed_tag_code_stays_markup() {
	let site = Site::new();
	assert_eq!(render(&site, "page.html", "<b tmpltag=x#oops>"), "<b tmpltag=x#oops>");
}

#[test]
fn collapses_escaped_quotes_in_tags() {
	let site = Site::new();
	assert_eq!(
		render(&site, "page.html", r#"<a title=\"x\" href=\\"y\">a \"quote\"</a>"#),
		r#"<a title="x" href="y">a \"quote\"</a>"#
	);
}

#[test]
fn rejects_the_reserved_marker() {
	let site = Site::new();
	site.template("page.html", "bad \u{E000} input");

	let mut templates = site.engine();
	let error = templates.render_to_string("page.html").unwrap_err();
	assert!(matches!(error, KstyleError::ReservedMarker { .. }));
	assert_eq!(templates.errors()["compile"].len(), 1);
}

#[test]
fn reads_superglobals_from_the_environment() -> KstyleResult<()> {
	let site = Site::new();
	site.template(
		"page.html",
		"{$_GET['page']}<!-- tmplphp: $_SESSION['seen'] = $_GET['page'] + 1; -->",
	);

	let mut templates = site.engine();
	templates.set_environment(HostEnvironment::new().with(Superglobal::Get, json!({ "page": "2" })));
	assert_eq!(templates.render_to_string("page.html")?, "2");

	let session = templates
		.environment()
		.and_then(|environment| environment.get(Superglobal::Session));
	assert_eq!(session, Some(&json!({ "seen": 3 })));
	assert!(templates.variables().get("_GET").is_none());

	Ok(())
}

#[test]
fn superglobals_without_an_environment() {
	let site = Site::new();
	assert_eq!(render(&site, "read.html", "[{$_SERVER['HTTP_HOST']}]"), "[]");

	site.template("write.html", "<!-- tmplphp: $_COOKIE['id'] = 1; -->");
	let mut templates = site.engine();
	let error = templates.render_to_string("write.html").unwrap_err();
	assert!(matches!(error, KstyleError::Runtime { .. }));
}

#[test]
fn superglobal_names_round_trip() {
	for global in Superglobal::ALL {
		assert_eq!(Superglobal::from_name(global.name()), Some(global));
	}
	assert_eq!(Superglobal::Session.to_string(), "_SESSION");
	assert_eq!(Superglobal::from_name("_OTHER"), None);
}

#[test]
fn collects_errors_per_operation() {
	let site = Site::new();
	let mut templates = site.engine();

	assert!(templates.render_to_string("one.html").is_err());
	assert!(templates.render_to_string("two.html").is_err());
	assert!(templates.assign_json(json!("x"), false).is_err());

	assert_eq!(
		templates.errors().keys().map(String::as_str).collect::<Vec<_>>(),
		vec!["getFile", "assign"]
	);
	assert_eq!(
		templates.log_entries(),
		vec![
			"getFile: Template ERROR: file one.html not exists",
			"getFile: Template ERROR: file two.html not exists",
			"assign: assigned variables must be a mapping of names to values",
		]
	);

	let report = templates.logs();
	assert_eq!(report.log_file, DEFAULT_LOG_FILE);
	assert_eq!(report.entries.len(), 3);
}

#[test]
fn debug_mode_halts_with_a_message() {
	let site = Site::new();
	let mut templates = site.engine();
	templates.set_debug(true);
	assert!(templates.is_debug());

	let mut out = Vec::new();
	let error = templates.render_to("missing.html", &mut out).unwrap_err();

	assert!(matches!(error, KstyleError::Halted { .. }));
	insta::assert_snapshot!(
		String::from_utf8(out).unwrap(),
		@"<b>getFile:</b> Template ERROR: file missing.html not exists"
	);
	assert_eq!(templates.errors()["getFile"].len(), 1);
}

#[test]
fn failed_renders_write_nothing() {
	let site = Site::new();
	site.template("page.html", "partial<!-- tmplphp: echo 1 / 0; -->");

	let mut templates = site.engine();
	let mut out = Vec::new();
	assert!(templates.render_to("page.html", &mut out).is_err());
	assert!(out.is_empty());
}

struct ClosedWriter;

impl std::io::Write for ClosedWriter {
	fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
		Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"))
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}

#[test]
fn write_failures_are_reported_as_output() {
	let site = Site::new();
	site.template("page.html", "content");

	let mut templates = site.engine();
	let error = templates.render_to("page.html", ClosedWriter).unwrap_err();
	assert!(matches!(error, KstyleError::Io(_)));
	assert_eq!(templates.errors()["output"], vec!["pipe closed".to_string()]);
}

#[test]
fn render_can_capture() -> KstyleResult<()> {
	let site = Site::new();
	site.template("page.html", "captured");

	let mut templates = site.engine();
	assert_eq!(
		templates.render("page.html", true)?,
		RenderOutput::Text("captured".into())
	);

	Ok(())
}

#[rstest]
#[case::parent("../secret.html")]
#[case::absolute("/etc/passwd")]
#[case::empty("")]
fn rejects_names_outside_the_style(#[case] name: &str) {
	let site = Site::new();
	let mut templates = site.engine();

	let error = templates.render_to_string(name).unwrap_err();
	assert!(matches!(error, KstyleError::InvalidTemplateName { .. }));
}

#[test]
fn requires_existing_directories() {
	let site = Site::new();
	let config = StyleConfig::new(site.dir.path().join("nope"), &site.cache_dir);

	let error = Templates::new(config).unwrap_err();
	assert!(matches!(error, KstyleError::Configuration(_)));
}

#[test]
fn loads_config_files() -> KstyleResult<()> {
	let site = Site::new();
	assert_eq!(StyleConfig::load(site.dir.path())?, None);

	std::fs::create_dir_all(site.dir.path().join(".config"))?;
	std::fs::write(
		site.dir.path().join(".config/kstyle.toml"),
		"style = \"blue\"\nsite_path = \"/shop\"\ndebug = true\n",
	)?;

	let config = StyleConfig::load(site.dir.path())?.unwrap();
	assert_eq!(config.style_dir, site.dir.path().join(".config/templates/blue"));
	assert_eq!(config.cache_dir, site.dir.path().join(".config/cache/blue"));
	assert_eq!(config.style_path(), "/shop/templates/blue");
	assert!(config.debug);
	assert_eq!(config.log_file, DEFAULT_LOG_FILE);

	Ok(())
}

#[test]
fn config_candidates_follow_precedence() -> KstyleResult<()> {
	let site = Site::new();
	std::fs::write(site.dir.path().join(".kstyle.toml"), "style = \"hidden\"\n")?;
	std::fs::write(site.dir.path().join("kstyle.toml"), "style = \"visible\"\n")?;

	let config = StyleConfig::load(site.dir.path())?.unwrap();
	assert_eq!(config.style, "visible");

	Ok(())
}

#[test]
fn invalid_config_is_reported() {
	let site = Site::new();
	std::fs::write(site.dir.path().join("kstyle.toml"), "style = ").unwrap();

	let error = StyleConfig::load(site.dir.path()).unwrap_err();
	assert!(matches!(error, KstyleError::ConfigParse { .. }));
}

#[rstest]
#[case::integer(json!(42), "42")]
#[case::whole_float(json!(2.0), "2")]
#[case::fraction(json!(1.5), "1.5")]
#[case::rounding(json!(0.1 + 0.2), "0.3")]
#[case::null(Value::Null, "")]
#[case::array(json!([1]), "Array")]
fn formats_output(#[case] input: Value, #[case] expected: &str) {
	assert_eq!(value::to_output(&input), expected);
}

#[rstest]
#[case::numeric_strings(Arithmetic::Add, json!("3"), json!(4), json!(7))]
#[case::exact_division(Arithmetic::Divide, json!(6), json!(2), json!(3))]
#[case::inexact_division(Arithmetic::Divide, json!(7), json!(2), json!(3.5))]
#[case::modulo(Arithmetic::Modulo, json!(7), json!(3), json!(1))]
#[case::overflow(Arithmetic::Multiply, json!(i64::MAX), json!(2), json!(i64::MAX as f64 * 2.0))]
#[case::min_divided_by_minus_one(Arithmetic::Divide, json!(i64::MIN), json!(-1), json!(-(i64::MIN as f64)))]
#[case::min_modulo_minus_one(Arithmetic::Modulo, json!(i64::MIN), json!(-1), json!(0))]
fn computes_arithmetic(
	#[case] op: Arithmetic,
	#[case] left: Value,
	#[case] right: Value,
	#[case] expected: Value,
) -> KstyleResult<()> {
	assert_eq!(value::arithmetic(op, &left, &right)?, expected);

	Ok(())
}

#[test]
fn appending_after_the_largest_index_saturates() -> KstyleResult<()> {
	let mut list = json!({ "9223372036854775807": "x" });
	*value::entry(&mut list, None)? = json!("y");
	assert_eq!(list, json!({ "9223372036854775807": "y" }));

	Ok(())
}

#[test]
fn division_by_zero_is_an_error() {
	assert!(value::arithmetic(Arithmetic::Divide, &json!(1), &json!(0)).is_err());
	assert!(value::arithmetic(Arithmetic::Modulo, &json!(1), &json!(0)).is_err());
}

#[test]
fn compares_loosely_and_strictly() {
	assert!(value::loose_eq(&json!("1"), &json!(1)));
	assert!(!value::strict_eq(&json!("1"), &json!(1)));
	assert!(value::strict_eq(&json!("abc"), &json!("abc")));
	assert!(value::is_truthy(&json!("a")));
	assert!(!value::is_truthy(&json!("0")));
	assert!(!value::is_truthy(&json!([])));
}

#[test]
fn numeric_string_keys_become_indexes() {
	assert_eq!(Key::from_value(&json!("5")), Key::Index(5));
	assert_eq!(Key::from_value(&json!("name")), Key::Name("name".into()));
	assert_eq!(Key::from_value(&json!(2)), Key::Index(2));
}

#[test]
fn parses_variable_paths() {
	let input = "user['name'][$id][0]} rest";
	let (path, used) = parse_path(input).unwrap();

	assert_eq!(path.root_name(), "user");
	assert_eq!(path.keys.len(), 3);
	assert!(input[used..].starts_with('}'));
	assert!(parse_path("9lives").is_none());
}

#[test]
fn artifacts_serialize_as_json() -> KstyleResult<()> {
	let compiler = Compiler::new("/")?;
	let artifact = compiler.compile("page.html", "<p>{$title}</p>")?;

	let json = serde_json::to_value(&artifact).unwrap();
	assert_eq!(json["schema_version"], json!(ARTIFACT_SCHEMA_VERSION));
	assert_eq!(json["template"], json!("page.html"));

	let decoded: Artifact = serde_json::from_value(json).unwrap();
	assert_eq!(decoded, artifact);

	Ok(())
}

#[test]
fn invalidate_forces_a_recompile() -> KstyleResult<()> {
	let site = Site::new();
	site.template("page.html", "x");
	let mut templates = site.engine();

	assert_eq!(templates.prepare("page.html")?, CacheStatus::Compiled);
	templates.invalidate("page.html")?;
	assert!(!site.artifact("page.html").exists());
	templates.invalidate("page.html")?;
	assert_eq!(templates.prepare("page.html")?, CacheStatus::Compiled);

	let error = templates.invalidate("../page.html").unwrap_err();
	assert!(matches!(error, KstyleError::InvalidTemplateName { .. }));

	Ok(())
}
