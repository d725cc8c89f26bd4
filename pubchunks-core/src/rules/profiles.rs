// Built-in publisher profiles
//
// JATS publishers share one base table and differ only in a few sections.
// Elsevier's full-text retrieval XML has its own table. The `unknown`
// profile reuses the JATS base so unrecognized articles still get a
// best-effort extraction.

use super::registry::ExtractionRule;
use crate::types::{Publisher, Section};
use std::collections::BTreeMap;

type Profile = BTreeMap<Section, ExtractionRule>;

pub fn builtin_profiles() -> BTreeMap<Publisher, Profile> {
    let mut profiles = BTreeMap::new();
    for publisher in Publisher::ALL {
        let profile = match publisher {
            Publisher::Elsevier => elsevier_profile(),
            Publisher::Elife => {
                let mut profile = jats_base_profile();
                profile.insert(
                    Section::ExecutiveSummary,
                    ExtractionRule::new(&["//article-meta/abstract[@abstract-type='executive-summary']"]),
                );
                profile
            }
            // No reference DOI markup in these publishers' JATS output
            Publisher::Hindawi | Publisher::Cogent => {
                let mut profile = jats_base_profile();
                profile.remove(&Section::RefsDois);
                profile
            }
            _ => jats_base_profile(),
        };
        profiles.insert(publisher, profile);
    }
    profiles
}

fn jats_base_profile() -> Profile {
    let mut profile = Profile::new();

    profile.insert(Section::Front, ExtractionRule::new(&["//article/front"]));
    profile.insert(Section::Body, ExtractionRule::new(&["//article/body"]));
    profile.insert(Section::Back, ExtractionRule::new(&["//article/back"]));
    profile.insert(
        Section::Title,
        ExtractionRule::new(&[
            "//article-meta/title-group/article-title",
            "//front//article-title",
        ]),
    );
    profile.insert(
        Section::Doi,
        ExtractionRule::new(&["//article-meta/article-id[@pub-id-type='doi']"]),
    );
    profile.insert(
        Section::Categories,
        ExtractionRule::new(&["//article-meta/article-categories//subject"]),
    );
    profile.insert(
        Section::Authors,
        ExtractionRule::new(&[
            "//article-meta/contrib-group/contrib[@contrib-type='author']",
            "//article-meta//contrib[@contrib-type='author']",
        ])
        .with_field("given_names", "name/given-names")
        .with_field("surname", "name/surname")
        .with_field("orcid", "contrib-id[@contrib-id-type='orcid']"),
    );
    profile.insert(
        Section::Aff,
        ExtractionRule::new(&["//article-meta//aff", "//front//aff"]).with_field("id", "@id"),
    );
    profile.insert(
        Section::Keywords,
        ExtractionRule::new(&["//article-meta/kwd-group/kwd", "//kwd-group/kwd"]),
    );
    profile.insert(
        Section::Abstract,
        ExtractionRule::new(&[
            "//article-meta/abstract[not(@abstract-type)]",
            "//article-meta/abstract",
        ]),
    );
    profile.insert(
        Section::Refs,
        ExtractionRule::new(&["//back/ref-list/ref", "//ref-list/ref"])
            .with_field("id", "@id")
            .with_field("label", "label")
            .with_field("doi", ".//pub-id[@pub-id-type='doi']")
            .with_field("year", ".//year"),
    );
    profile.insert(
        Section::RefsDois,
        ExtractionRule::new(&["//ref-list/ref//pub-id[@pub-id-type='doi']"]),
    );
    profile.insert(
        Section::Publisher,
        ExtractionRule::new(&["//journal-meta/publisher/publisher-name"]),
    );
    profile.insert(
        Section::JournalMeta,
        ExtractionRule::new(&["//front/journal-meta"]),
    );
    profile.insert(
        Section::ArticleMeta,
        ExtractionRule::new(&["//front/article-meta"]),
    );
    profile.insert(
        Section::Acknowledgments,
        ExtractionRule::new(&["//back/ack", "//ack"]),
    );
    profile.insert(
        Section::Permissions,
        ExtractionRule::new(&["//article-meta/permissions"]),
    );
    profile.insert(
        Section::History,
        ExtractionRule::new(&["//article-meta/history/date"])
            .with_field("type", "@date-type")
            .with_field("year", "year")
            .with_field("month", "month")
            .with_field("day", "day"),
    );

    profile
}

/// Elsevier full-text retrieval responses (coredata + originalText).
/// Every element sits in a namespace, so steps use the `*:` wildcard.
fn elsevier_profile() -> Profile {
    let mut profile = Profile::new();

    profile.insert(Section::Front, ExtractionRule::new(&["//*:originalText//*:head"]));
    profile.insert(Section::Body, ExtractionRule::new(&["//*:originalText//*:body"]));
    profile.insert(Section::Back, ExtractionRule::new(&["//*:originalText//*:tail"]));
    profile.insert(
        Section::Title,
        ExtractionRule::new(&["//*:coredata/*:title", "//*:head/*:title"]),
    );
    profile.insert(Section::Doi, ExtractionRule::new(&["//*:coredata/*:doi"]));
    profile.insert(
        Section::Authors,
        ExtractionRule::new(&["//*:head//*:author-group/*:author", "//*:coredata/*:creator"])
            .with_field("given_names", "*:given-name")
            .with_field("surname", "*:surname"),
    );
    profile.insert(
        Section::Aff,
        ExtractionRule::new(&["//*:author-group/*:affiliation"]).with_field("id", "@id"),
    );
    profile.insert(
        Section::Keywords,
        ExtractionRule::new(&["//*:head//*:keywords/*:keyword", "//*:coredata/*:subject"]),
    );
    profile.insert(
        Section::Abstract,
        ExtractionRule::new(&["//*:head//*:abstract", "//*:coredata/*:description"]),
    );
    profile.insert(
        Section::Refs,
        ExtractionRule::new(&["//*:bib-reference"])
            .with_field("id", "@id")
            .with_field("label", "*:label"),
    );
    profile.insert(
        Section::Publisher,
        ExtractionRule::new(&["//*:coredata/*:publisher"]),
    );
    profile.insert(
        Section::Acknowledgments,
        ExtractionRule::new(&["//*:acknowledgment"]),
    );

    profile
}
