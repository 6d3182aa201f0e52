//! SOAP envelope builders for archive service requests.
//!
//! Every service call POSTs one of these XML envelopes. User-supplied text
//! is escaped before interpolation; structural values (dates, cursors,
//! numeric ids) are rendered directly.

use crate::types::PageRequest;

/// Escape a string for use as XML text or attribute content.
pub fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Envelope for the `Authenticate` operation.
pub fn authenticate(username: &str, password: &str) -> String {
    format!(
        r#"<SOAP-ENV:Envelope
    xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"
    SOAP-ENV:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <soap:Body xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
    <Authenticate xmlns="http://authenticate.authentication.services.v1.wsapi.archive.example.com">
      <authId>{}</authId>
      <password>{}</password>
    </Authenticate>
  </soap:Body>
</SOAP-ENV:Envelope>"#,
        xml_escape(username),
        xml_escape(password),
    )
}

/// Envelope for the `Search` operation covering one date window and one
/// result cursor.
pub fn search(token: &str, project_id: &str, request: &PageRequest) -> String {
    format!(
        r#"<SOAP-ENV:Envelope
    xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"
    SOAP-ENV:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <soap:Body xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
    <Search xmlns="http://search.search.services.v1.wsapi.archive.example.com">
      <binarySecurityToken>{token}</binarySecurityToken>
      <sourceInformation>
        <sourceIdList xmlns="http://common.search.services.v1.wsapi.archive.example.com">
          <sourceId xmlns="http://common.services.v1.wsapi.archive.example.com">{source_id}</sourceId>
        </sourceIdList>
      </sourceInformation>
      <query>{query}</query>
      <projectId>{project_id}</projectId>
      <searchOptions>
        <sortOrder xmlns="http://common.search.services.v1.wsapi.archive.example.com">Date</sortOrder>
        <dateRestriction xmlns="http://common.search.services.v1.wsapi.archive.example.com">
          <startDate>{start_date}</startDate>
          <endDate>{end_date}</endDate>
        </dateRestriction>
      </searchOptions>
      <retrievalOptions>
        <documentView xmlns="http://result.common.services.v1.wsapi.archive.example.com">Cite</documentView>
        <documentMarkup xmlns="http://result.common.services.v1.wsapi.archive.example.com">Display</documentMarkup>
        <documentRange xmlns="http://result.common.services.v1.wsapi.archive.example.com">
          <begin>{begin}</begin>
          <end>{end}</end>
        </documentRange>
      </retrievalOptions>
    </Search>
  </soap:Body>
</SOAP-ENV:Envelope>"#,
        token = xml_escape(token),
        source_id = request.source_id,
        query = xml_escape(&request.query),
        project_id = xml_escape(project_id),
        start_date = request.window_start.format("%Y-%m-%d"),
        end_date = request.window_end.format("%Y-%m-%d"),
        begin = request.result_begin,
        end = request.result_end,
    )
}

/// Envelope for the `GetDocumentsByDocumentId` operation, fetching one
/// document's full text.
pub fn retrieve_document(token: &str, doc_id: &str) -> String {
    format!(
        r#"<SOAP-ENV:Envelope
    xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"
    SOAP-ENV:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <soap:Body xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
    <GetDocumentsByDocumentId xmlns="http://getdocumentsbydocumentid.retrieve.services.v1.wsapi.archive.example.com">
      <binarySecurityToken>{}</binarySecurityToken>
      <documentIdList>
        <documentId>{}</documentId>
      </documentIdList>
      <retrievalOptions>
        <documentView>FullText</documentView>
        <documentMarkup>Display</documentMarkup>
      </retrievalOptions>
    </GetDocumentsByDocumentId>
  </soap:Body>
</SOAP-ENV:Envelope>"#,
        xml_escape(token),
        xml_escape(doc_id),
    )
}

/// Envelope for the `BrowseSources` operation. Without a folder id the
/// service lists the top-level folders.
pub fn browse_sources(token: &str, folder_id: Option<&str>) -> String {
    let folder_arg = match folder_id {
        Some(id) => format!("<folderId>{}</folderId>", xml_escape(id)),
        None => String::new(),
    };
    format!(
        r#"<SOAP-ENV:Envelope
    xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"
    SOAP-ENV:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <soap:Body xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
    <BrowseSources xmlns="http://browsesources.source.services.v1.wsapi.archive.example.com">
      <locale>en-US</locale>
      <binarySecurityToken>{}</binarySecurityToken>
      {}
    </BrowseSources>
  </soap:Body>
</SOAP-ENV:Envelope>"#,
        xml_escape(token),
        folder_arg,
    )
}

/// Envelope for the `SearchSources` operation.
pub fn search_sources(token: &str, partial_name: &str) -> String {
    format!(
        r#"<SOAP-ENV:Envelope
    xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"
    SOAP-ENV:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <soap:Body xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
    <SearchSources xmlns="http://searchsources.source.services.v1.wsapi.archive.example.com">
      <locale>en-US</locale>
      <binarySecurityToken>{}</binarySecurityToken>
      <partialSourceName>{}</partialSourceName>
    </SearchSources>
  </soap:Body>
</SOAP-ENV:Envelope>"#,
        xml_escape(token),
        xml_escape(partial_name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageRequest;

    fn sample_request() -> PageRequest {
        PageRequest {
            query: "liberal arts".to_string(),
            source_id: 163_823,
            window_start: "2017-01-01".parse().unwrap(),
            window_end: "2017-01-31".parse().unwrap(),
            result_begin: 11,
            result_end: 20,
        }
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(xml_escape(r#""quoted""#), "&quot;quoted&quot;");
        assert_eq!(xml_escape("plain"), "plain");
    }

    #[test]
    fn test_authenticate_envelope_contains_credentials() {
        let envelope = authenticate("user@example.com", "p<ss");
        assert!(envelope.contains("<authId>user@example.com</authId>"));
        assert!(envelope.contains("<password>p&lt;ss</password>"));
    }

    #[test]
    fn test_search_envelope_fields() {
        let envelope = search("tok-123", "proj-9", &sample_request());
        assert!(envelope.contains("<binarySecurityToken>tok-123</binarySecurityToken>"));
        assert!(envelope.contains("<query>liberal arts</query>"));
        assert!(envelope.contains("<projectId>proj-9</projectId>"));
        assert!(envelope.contains("<startDate>2017-01-01</startDate>"));
        assert!(envelope.contains("<endDate>2017-01-31</endDate>"));
        assert!(envelope.contains("<begin>11</begin>"));
        assert!(envelope.contains("<end>20</end>"));
        assert!(envelope.contains("<sourceId"));
        assert!(envelope.contains(">163823</sourceId>"));
    }

    #[test]
    fn test_search_envelope_escapes_query() {
        let mut request = sample_request();
        request.query = r#"tuition & "fees""#.to_string();
        let envelope = search("tok", "proj", &request);
        assert!(envelope.contains("tuition &amp; &quot;fees&quot;"));
    }

    #[test]
    fn test_retrieve_document_envelope() {
        let envelope = retrieve_document("tok", "02A6A252C52");
        assert!(envelope.contains("<documentId>02A6A252C52</documentId>"));
        assert!(envelope.contains("<documentView>FullText</documentView>"));
    }

    #[test]
    fn test_browse_sources_envelope_with_and_without_folder() {
        let with_folder = browse_sources("tok", Some("F12"));
        assert!(with_folder.contains("<folderId>F12</folderId>"));
        let without = browse_sources("tok", None);
        assert!(!without.contains("<folderId>"));
    }

    #[test]
    fn test_search_sources_envelope() {
        let envelope = search_sources("tok", "Chicago");
        assert!(envelope.contains("<partialSourceName>Chicago</partialSourceName>"));
    }
}
