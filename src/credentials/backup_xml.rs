//! Scanner for Android settings-backup XML.
//!
//! Restored backups (and `WifiConfigStore.xml`) hold a flat list of networks:
//!
//! ```text
//! <NetworkList>
//!   <WifiConfiguration>
//!     <string name="SSID">&quot;Home&quot;</string>
//!     <string name="PreSharedKey">&quot;secret&quot;</string>
//!   </WifiConfiguration>
//!   <WifiConfiguration>
//!     <string name="SSID">&quot;Old&quot;</string>
//!     <string-array name="WEPKeys" num="4">
//!       <item value="&quot;wepkey1&quot;" />
//!     </string-array>
//!   </WifiConfiguration>
//! </NetworkList>
//! ```
//!
//! The document is read in a single forward pass with a pull reader. Elements
//! that are not of interest are skipped by counting start and end tags, so
//! the cursor always sits right after the element it just consumed.
//!
//! # Example
//!
//! ```
//! use wifi_barcode::backup_xml;
//!
//! let xml = r#"<NetworkList><WifiConfiguration>
//!     <string name="SSID">Test</string>
//!     <string name="PreSharedKey">"secret"</string>
//! </WifiConfiguration></NetworkList>"#;
//! let pw = backup_xml::find_password_in_str(xml, "Test").unwrap();
//! assert_eq!(pw.as_deref(), Some("secret"));
//! ```

use super::{strip_quotes, ScanError, WifiCredential};
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

/// Root element of the network list.
const NETWORK_LIST: &str = "NetworkList";

/// One saved network.
const WIFI_CONFIGURATION: &str = "WifiConfiguration";

/// Find the key of the first `WifiConfiguration` whose SSID equals `ssid`.
///
/// Returns `Some("")` when the SSID matches but the element has no key
/// field, and `None` when no element matches. Malformed XML is an error.
pub fn find_password<R: BufRead>(reader: R, ssid: &str) -> Result<Option<String>, ScanError> {
    let query = strip_quotes(ssid);
    let mut pull = PullReader::new(reader);

    if !pull.seek_start(NETWORK_LIST)? {
        debug!("no {} element", NETWORK_LIST);
        return Ok(None);
    }
    let list_depth = pull.depth;

    while pull.seek_child(WIFI_CONFIGURATION, list_depth)? {
        if let Some(password) = match_network(&mut pull, query)? {
            return Ok(Some(password));
        }
    }
    Ok(None)
}

/// [`find_password`] over an in-memory document.
pub fn find_password_in_str(xml: &str, ssid: &str) -> Result<Option<String>, ScanError> {
    find_password(xml.as_bytes(), ssid)
}

/// List every `WifiConfiguration` that carries an SSID.
///
/// A pre-shared key wins over WEP keys when an element has both.
pub fn parse_networks<R: BufRead>(reader: R) -> Result<Vec<WifiCredential>, ScanError> {
    let mut pull = PullReader::new(reader);
    let mut out = Vec::new();

    if !pull.seek_start(NETWORK_LIST)? {
        return Ok(out);
    }
    let list_depth = pull.depth;

    while pull.seek_child(WIFI_CONFIGURATION, list_depth)? {
        let mut ssid = None;
        let mut psk = None;
        let mut wep = None;
        while let Some(field) = pull.next_field()? {
            match field {
                Field::Ssid(value) => ssid = ssid.or(Some(value)),
                Field::PreSharedKey(value) => psk = psk.or(Some(value)),
                Field::WepKey(value) => wep = wep.or(value),
            }
        }
        if let Some(ssid) = ssid {
            out.push(WifiCredential::new(ssid, psk.or(wep)));
        }
    }
    Ok(out)
}

/// Consume one `WifiConfiguration` body, returning the key if it matches.
///
/// On an SSID mismatch the rest of the element is skipped immediately.
fn match_network<R: BufRead>(
    pull: &mut PullReader<R>,
    query: &str,
) -> Result<Option<String>, ScanError> {
    let mut ssid_matched = false;
    let mut password: Option<String> = None;

    while let Some(field) = pull.next_field()? {
        match field {
            Field::Ssid(value) => {
                if value != query {
                    debug!("skipping network {:?}", value);
                    pull.skip(1)?;
                    return Ok(None);
                }
                if let Some(password) = password.take() {
                    return Ok(Some(password));
                }
                ssid_matched = true;
            }
            Field::PreSharedKey(value) => {
                if ssid_matched {
                    return Ok(Some(value));
                }
                password = Some(value);
            }
            Field::WepKey(Some(value)) => {
                if ssid_matched {
                    return Ok(Some(value));
                }
                password = Some(value);
            }
            Field::WepKey(None) => {}
        }
    }

    if ssid_matched {
        Ok(Some(password.unwrap_or_default()))
    } else {
        Ok(None)
    }
}

/// Child of a `WifiConfiguration` that carries credential data.
#[derive(Debug, PartialEq, Eq)]
enum Field {
    Ssid(String),
    PreSharedKey(String),
    WepKey(Option<String>),
}

/// Owned view of a start or empty tag.
#[derive(Debug)]
struct Element {
    name: String,
    name_attr: Option<String>,
    value_attr: Option<String>,
}

impl Element {
    fn from_start(e: &BytesStart<'_>) -> Result<Self, ScanError> {
        Ok(Self {
            name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
            name_attr: attribute(e, "name")?,
            value_attr: attribute(e, "value")?,
        })
    }

    fn is(&self, name: &str, name_attr: &str) -> bool {
        self.name == name && self.name_attr.as_deref() == Some(name_attr)
    }
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>, ScanError> {
    match e.try_get_attribute(key)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

/// Simplified, owned pull event.
#[derive(Debug)]
enum Tag {
    Start(Element),
    Empty(Element),
    Text(String),
    End,
    Eof,
}

/// Forward-only reader that tracks element depth.
struct PullReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    depth: usize,
}

impl<R: BufRead> PullReader<R> {
    fn new(reader: R) -> Self {
        Self {
            reader: Reader::from_reader(reader),
            buf: Vec::new(),
            depth: 0,
        }
    }

    /// Next event of interest. Declarations, comments and processing
    /// instructions are dropped. End of input inside an open element is an
    /// error.
    fn next(&mut self) -> Result<Tag, ScanError> {
        loop {
            self.buf.clear();
            let tag = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => {
                    self.depth += 1;
                    Tag::Start(Element::from_start(&e)?)
                }
                Event::Empty(e) => Tag::Empty(Element::from_start(&e)?),
                Event::End(_) => {
                    self.depth = self.depth.saturating_sub(1);
                    Tag::End
                }
                Event::Text(t) => Tag::Text(t.unescape()?.into_owned()),
                Event::CData(c) => Tag::Text(String::from_utf8_lossy(&c.into_inner()).into_owned()),
                Event::Eof if self.depth > 0 => {
                    return Err(ScanError::Xml(format!(
                        "unexpected end of document with {} unclosed element(s)",
                        self.depth
                    )));
                }
                Event::Eof => Tag::Eof,
                _ => continue,
            };
            return Ok(tag);
        }
    }

    /// Advance to the next start tag named `name`, descending into any
    /// element on the way. Returns `false` at end of document.
    fn seek_start(&mut self, name: &str) -> Result<bool, ScanError> {
        loop {
            match self.next()? {
                Tag::Start(el) if el.name == name => return Ok(true),
                Tag::Eof => return Ok(false),
                _ => {}
            }
        }
    }

    /// Like [`seek_start`](Self::seek_start), but gives up once the element
    /// opened at `depth` has closed.
    fn seek_child(&mut self, name: &str, depth: usize) -> Result<bool, ScanError> {
        loop {
            match self.next()? {
                Tag::Start(el) if el.name == name => return Ok(true),
                Tag::End if self.depth < depth => return Ok(false),
                Tag::Eof => return Ok(false),
                _ => {}
            }
        }
    }

    /// Skip until `depth` more end tags than start tags have been read.
    fn skip(&mut self, mut depth: usize) -> Result<(), ScanError> {
        while depth > 0 {
            match self.next()? {
                Tag::Start(_) => depth += 1,
                Tag::End => depth -= 1,
                Tag::Eof => return Err(ScanError::Xml("unexpected end of document".into())),
                Tag::Empty(_) | Tag::Text(_) => {}
            }
        }
        Ok(())
    }

    /// Text content up to the end of the current element.
    fn read_text(&mut self) -> Result<String, ScanError> {
        let mut text = String::new();
        loop {
            match self.next()? {
                Tag::Text(t) => text.push_str(&t),
                Tag::Start(_) => self.skip(1)?,
                Tag::Empty(_) => {}
                Tag::End => return Ok(text),
                Tag::Eof => return Err(ScanError::Xml("unexpected end of document".into())),
            }
        }
    }

    /// `value` of the first `item` in the current array, consuming the array.
    ///
    /// Only the first item counts. If it has no `value`, later items are
    /// ignored.
    fn read_first_item(&mut self) -> Result<Option<String>, ScanError> {
        let mut first: Option<Option<String>> = None;
        loop {
            match self.next()? {
                Tag::Empty(el) => {
                    if first.is_none() && el.name == "item" {
                        first = Some(el.value_attr);
                    }
                }
                Tag::Start(el) => {
                    if first.is_none() && el.name == "item" {
                        first = Some(el.value_attr);
                    }
                    self.skip(1)?;
                }
                Tag::Text(_) => {}
                Tag::End => return Ok(first.flatten()),
                Tag::Eof => return Err(ScanError::Xml("unexpected end of document".into())),
            }
        }
    }

    /// Next credential field of the current `WifiConfiguration`.
    ///
    /// Unrelated children are skipped. Returns `None` once the element's end
    /// tag has been consumed.
    fn next_field(&mut self) -> Result<Option<Field>, ScanError> {
        loop {
            match self.next()? {
                Tag::Start(el) if el.is("string", "SSID") => {
                    let text = self.read_text()?;
                    return Ok(Some(Field::Ssid(strip_quotes(&text).to_string())));
                }
                Tag::Start(el) if el.is("string", "PreSharedKey") => {
                    let text = self.read_text()?;
                    return Ok(Some(Field::PreSharedKey(strip_quotes(&text).to_string())));
                }
                Tag::Start(el) if el.is("string-array", "WEPKeys") => {
                    let first = self.read_first_item()?;
                    return Ok(Some(Field::WepKey(
                        first.map(|v| strip_quotes(&v).to_string()),
                    )));
                }
                Tag::Empty(el) if el.is("string", "SSID") => {
                    return Ok(Some(Field::Ssid(String::new())));
                }
                Tag::Empty(el) if el.is("string", "PreSharedKey") => {
                    return Ok(Some(Field::PreSharedKey(String::new())));
                }
                Tag::Start(_) => self.skip(1)?,
                Tag::End => return Ok(None),
                Tag::Empty(_) | Tag::Text(_) => {}
                Tag::Eof => return Err(ScanError::Xml("unexpected end of document".into())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network_list(body: &str) -> String {
        format!(
            "<?xml version='1.0' encoding='utf-8' standalone='yes' ?>\n<NetworkList>\n{}\n</NetworkList>\n",
            body
        )
    }

    fn psk_network(ssid: &str, psk: &str) -> String {
        format!(
            "<WifiConfiguration>\n\
             <string name=\"ConfigKey\">&quot;{0}&quot;WPA_PSK</string>\n\
             <string name=\"SSID\">&quot;{0}&quot;</string>\n\
             <null name=\"BSSID\" />\n\
             <string name=\"PreSharedKey\">&quot;{1}&quot;</string>\n\
             <boolean name=\"HiddenSSID\" value=\"false\" />\n\
             </WifiConfiguration>",
            ssid, psk
        )
    }

    // ==================== find_password Tests ====================

    #[test]
    fn test_finds_psk() {
        let xml = network_list(&psk_network("Test", "secret"));
        assert_eq!(find_password_in_str(&xml, "Test").unwrap(), Some("secret".into()));
    }

    #[test]
    fn test_unquoted_values() {
        let xml = network_list(
            "<WifiConfiguration><string name=\"SSID\">Test</string>\
             <string name=\"PreSharedKey\">secret</string></WifiConfiguration>",
        );
        assert_eq!(find_password_in_str(&xml, "Test").unwrap(), Some("secret".into()));
    }

    #[test]
    fn test_missing_psk_is_empty_string() {
        let xml = network_list(
            "<WifiConfiguration>\n\
             <string name=\"SSID\">&quot;Test&quot;</string>\n\
             <string name=\"KeyMgmt\">NONE</string>\n\
             </WifiConfiguration>",
        );
        assert_eq!(find_password_in_str(&xml, "Test").unwrap(), Some(String::new()));
    }

    #[test]
    fn test_missing_element_is_absent() {
        let xml = network_list(&psk_network("Other", "secret"));
        assert_eq!(find_password_in_str(&xml, "Test").unwrap(), None);
    }

    #[test]
    fn test_element_without_ssid_is_absent() {
        let xml = network_list(
            "<WifiConfiguration><string name=\"PreSharedKey\">orphan</string></WifiConfiguration>",
        );
        assert_eq!(find_password_in_str(&xml, "Test").unwrap(), None);
    }

    #[test]
    fn test_skips_mismatched_networks() {
        let body = format!(
            "{}\n{}\n{}",
            psk_network("First", "one111111"),
            psk_network("Second", "two222222"),
            psk_network("Third", "three3333")
        );
        let xml = network_list(&body);
        assert_eq!(find_password_in_str(&xml, "Third").unwrap(), Some("three3333".into()));
        assert_eq!(find_password_in_str(&xml, "Second").unwrap(), Some("two222222".into()));
    }

    #[test]
    fn test_ssid_is_case_sensitive() {
        let xml = network_list(&psk_network("Test", "secret"));
        assert_eq!(find_password_in_str(&xml, "test").unwrap(), None);
    }

    #[test]
    fn test_psk_before_ssid() {
        let xml = network_list(
            "<WifiConfiguration>\
             <string name=\"PreSharedKey\">&quot;early&quot;</string>\
             <string name=\"SSID\">&quot;Late&quot;</string>\
             </WifiConfiguration>",
        );
        assert_eq!(find_password_in_str(&xml, "Late").unwrap(), Some("early".into()));
    }

    #[test]
    fn test_quoted_query() {
        let xml = network_list(&psk_network("Test", "secret"));
        assert_eq!(
            find_password_in_str(&xml, "\"Test\"").unwrap(),
            Some("secret".into())
        );
    }

    #[test]
    fn test_wep_keys() {
        let xml = network_list(
            "<WifiConfiguration>\n\
             <string name=\"SSID\">&quot;Old&quot;</string>\n\
             <string-array name=\"WEPKeys\" num=\"4\">\n\
             <item value=\"&quot;wepkey1&quot;\" />\n\
             <item value=\"\" />\n\
             </string-array>\n\
             </WifiConfiguration>",
        );
        assert_eq!(find_password_in_str(&xml, "Old").unwrap(), Some("wepkey1".into()));
    }

    #[test]
    fn test_wep_keys_without_quotes() {
        let xml = network_list(
            "<WifiConfiguration>\
             <string-array name=\"WEPKeys\"><item value=\"wepkey1\"/></string-array>\
             <string name=\"SSID\">Old</string>\
             </WifiConfiguration>",
        );
        assert_eq!(find_password_in_str(&xml, "Old").unwrap(), Some("wepkey1".into()));
    }

    #[test]
    fn test_wep_key_only_first_item_counts() {
        let xml = network_list(
            "<WifiConfiguration>\
             <string name=\"SSID\">Old</string>\
             <string-array name=\"WEPKeys\"><item/><item value=\"second\"/></string-array>\
             </WifiConfiguration>",
        );
        assert_eq!(find_password_in_str(&xml, "Old").unwrap(), Some(String::new()));
        assert_eq!(
            parse_networks(xml.as_bytes()).unwrap(),
            vec![WifiCredential::new("Old", None)]
        );
    }

    #[test]
    fn test_self_closing_ssid_is_empty() {
        let xml = network_list(
            "<WifiConfiguration>\
             <string name=\"SSID\" />\
             <string name=\"PreSharedKey\">hidden-key</string>\
             </WifiConfiguration>",
        );
        assert_eq!(find_password_in_str(&xml, "").unwrap(), Some("hidden-key".into()));
        assert_eq!(find_password_in_str(&xml, "Other").unwrap(), None);
    }

    #[test]
    fn test_self_closing_psk_is_empty() {
        let xml = network_list(
            "<WifiConfiguration>\
             <string name=\"SSID\">Test</string>\
             <string name=\"PreSharedKey\" />\
             <string-array name=\"WEPKeys\"><item value=\"unused\"/></string-array>\
             </WifiConfiguration>",
        );
        assert_eq!(find_password_in_str(&xml, "Test").unwrap(), Some(String::new()));
    }

    #[test]
    fn test_ignores_networks_after_list_closes() {
        let xml = "<Backup><NetworkList></NetworkList>\
                   <WifiConfiguration><string name=\"SSID\">X</string>\
                   <string name=\"PreSharedKey\">leak</string></WifiConfiguration></Backup>";
        assert_eq!(find_password_in_str(xml, "X").unwrap(), None);
        assert!(parse_networks(xml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_nested_network_wrapper() {
        let xml = format!(
            "<WifiConfigStoreData><int name=\"Version\" value=\"3\" />\
             <NetworkList><Network>{}<NetworkStatus /></Network>\
             <Network>{}<NetworkStatus /></Network></NetworkList></WifiConfigStoreData>",
            psk_network("A", "alpha-key"),
            psk_network("B", "bravo-key")
        );
        assert_eq!(find_password_in_str(&xml, "B").unwrap(), Some("bravo-key".into()));
    }

    #[test]
    fn test_skips_nested_unrelated_children() {
        let xml = network_list(
            "<WifiConfiguration>\
             <IpConfiguration><string name=\"SSID\">Decoy</string></IpConfiguration>\
             <string name=\"SSID\">Real</string>\
             <string name=\"PreSharedKey\">real-key</string>\
             </WifiConfiguration>",
        );
        assert_eq!(find_password_in_str(&xml, "Real").unwrap(), Some("real-key".into()));
        assert_eq!(find_password_in_str(&xml, "Decoy").unwrap(), None);
    }

    #[test]
    fn test_no_network_list() {
        assert_eq!(find_password_in_str("<Other />", "Test").unwrap(), None);
    }

    #[test]
    fn test_entity_unescaping() {
        let xml = network_list(&psk_network("Tom &amp; Jerry", "a&lt;b"));
        assert_eq!(
            find_password_in_str(&xml, "Tom & Jerry").unwrap(),
            Some("a<b".into())
        );
    }

    // ==================== Error Tests ====================

    #[test]
    fn test_unterminated_tag_is_error() {
        let xml = "<NetworkList><WifiConfiguration><string name=\"SSID\"";
        assert!(matches!(
            find_password_in_str(xml, "Test"),
            Err(ScanError::Xml(_))
        ));
    }

    #[test]
    fn test_truncated_document_is_error() {
        let xml = "<NetworkList><WifiConfiguration><string name=\"SSID\">Test</string>\
                   <string name=\"PreSharedKey\">sec";
        assert!(matches!(
            find_password_in_str(xml, "Test"),
            Err(ScanError::Xml(_))
        ));
    }

    #[test]
    fn test_mismatched_end_tag_is_error() {
        let xml = "<NetworkList><WifiConfiguration><string name=\"SSID\">Other</strin>\
                   </WifiConfiguration></NetworkList>";
        assert!(find_password_in_str(xml, "Test").is_err());
    }

    // ==================== parse_networks Tests ====================

    #[test]
    fn test_parse_networks() {
        let body = format!(
            "{}\n<WifiConfiguration><string name=\"SSID\">&quot;Open&quot;</string></WifiConfiguration>\n\
             <WifiConfiguration><string name=\"SSID\">Old</string>\
             <string-array name=\"WEPKeys\"><item value=\"&quot;wep&quot;\"/></string-array></WifiConfiguration>",
            psk_network("Home", "home-pass")
        );
        let xml = network_list(&body);
        let networks = parse_networks(xml.as_bytes()).unwrap();
        assert_eq!(
            networks,
            vec![
                WifiCredential::new("Home", Some("home-pass".into())),
                WifiCredential::new("Open", None),
                WifiCredential::new("Old", Some("wep".into())),
            ]
        );
    }
}
