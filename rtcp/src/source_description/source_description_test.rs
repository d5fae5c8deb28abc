use super::*;

#[test]
fn test_source_description_roundtrip() -> Result<()> {
    let sdes = SourceDescription {
        chunks: vec![SourceDescriptionChunk {
            source: 0x902f9e2e,
            cname: "user@example.com".to_string(),
        }],
    };

    let raw = sdes.marshal()?;
    assert_eq!(raw[1], 202);
    assert_eq!(raw.len() % 4, 0);

    let parsed = SourceDescription::unmarshal(&raw)?;
    assert_eq!(parsed, sdes);
    Ok(())
}

#[test]
fn test_source_description_two_chunks() -> Result<()> {
    let sdes = SourceDescription {
        chunks: vec![
            SourceDescriptionChunk {
                source: 1,
                cname: "a".to_string(),
            },
            SourceDescriptionChunk {
                source: 2,
                cname: "bc".to_string(),
            },
        ],
    };

    let raw = sdes.marshal()?;
    let parsed = SourceDescription::unmarshal(&raw)?;
    assert_eq!(parsed, sdes);
    Ok(())
}
