// Test fixtures with known pages and expected outputs
// WHY: Golden-file testing requires deterministic input/output pairs for validation

/// Biography page: prose to rewrite, plus a form and a script that must stay untouched
pub const BIO_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>About Sam</title></head>
<body>
<h1>About Sam</h1>
<p>Sam is a carpenter. He builds tables and his chairs sell quickly.</p>
<p>Does he take commissions? Yes, he does.</p>
<form><textarea>He wrote this note himself.</textarea></form>
<script>var he = "his";</script>
</body>
</html>
"#;

/// BIO_PAGE after pronoun rewriting
pub const BIO_EXPECTED: &str = r#"<!DOCTYPE html>
<html>
<head><title>About Sam</title></head>
<body>
<h1>About Sam</h1>
<p>Sam is a carpenter. They build tables and their chairs sell quickly.</p>
<p>Do they take commissions? Yes, they do.</p>
<form><textarea>He wrote this note himself.</textarea></form>
<script>var he = "his";</script>
</body>
</html>
"#;

/// Profile stating its author's pronouns; highlighted, never rewritten
pub const SPEC_PAGE: &str = "<p>Pronouns: they/them</p>\n<p>She said he smokes.</p>\n";

/// Essay whose visible text discusses gender
pub const GENDER_PAGE: &str = "<p>A short history of gender roles. She wrote it.</p>\n";

/// GENDER_PAGE after highlighting
pub const GENDER_EXPECTED: &str =
    "<p>A short history of <strong class=\"dgtw hide\">gender</strong> roles. She wrote it.</p>\n";

/// Page with nothing to change
pub const NEUTRAL_PAGE: &str = "<p>They arrived early and left late.</p>\n";
