//! 1fichier-shaped HTML fixtures.

pub fn listing(name: &str, size: &str, token: Option<&str>, link: Option<&str>) -> String {
    let form = token.map_or_else(String::new, |token| {
        format!(
            r#"<form method="post" action=""><input type="hidden" name="adz" value="{token}"><input type="submit" value="Access to download"></form>"#
        )
    });
    let anchor = link.map_or_else(String::new, |link| {
        format!(r#"<a href="{link}" class="ok btn-general btn-orange">Click here to download the file</a>"#)
    });
    format!(
        r#"<html><body>
<table class="premium">
  <tr><td class="normal">File name :</td><td class="normal">{name}</td></tr>
  <tr><td class="normal">Size :</td><td class="normal">{size}</td></tr>
</table>
{form}
{anchor}
</body></html>"#
    )
}

pub fn link_page(link: &str) -> String {
    format!(
        r#"<html><body><a href="{link}" class="ok btn-general btn-orange">Click here to download the file</a></body></html>"#
    )
}

pub fn warning_page(text: &str) -> String {
    format!(r#"<html><body><div class="ct_warn">{text}</div></body></html>"#)
}
