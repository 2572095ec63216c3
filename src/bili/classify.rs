// src/bili/classify.rs
// Pure classification of one raw dynamic item into a normalized record.
// Reposts embed their original item under `orig`; the original is resolved
// by one recursive pass, and an unparseable original suppresses the whole
// repost (it carries no information on its own).

use serde_json::Value;

use crate::bili::{ARTICLE_URL_PREFIX, DYNAMIC_URL_PREFIX, MUSIC_URL_PREFIX, VIDEO_URL_PREFIX};
use crate::json;

// The platform schema nests originals one level deep; anything deeper is
// malformed input.
pub const MAX_FORWARD_DEPTH: usize = 2;

const TYPE_FORWARD: &str = "DYNAMIC_TYPE_FORWARD";
const TYPE_DRAW: &str = "DYNAMIC_TYPE_DRAW";
const TYPE_AV: &str = "DYNAMIC_TYPE_AV";
const TYPE_WORD: &str = "DYNAMIC_TYPE_WORD";
const TYPE_ARTICLE: &str = "DYNAMIC_TYPE_ARTICLE";
const TYPE_MUSIC: &str = "DYNAMIC_TYPE_MUSIC";
const TYPE_PGC: &str = "DYNAMIC_TYPE_PGC";
// Auto-generated when an account starts broadcasting; dropped at top level
// because the live poller already covers that signal.
const TYPE_LIVE_RCMD: &str = "DYNAMIC_TYPE_LIVE_RCMD";

/// Closed classification of the known dynamic types, plus a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicKind {
    Word,
    Draw,
    Video,
    Forward,
    SharedLive,
    Article,
    Music,
    Pgc,
    LiveRcmd,
    Other,
}

impl DynamicKind {
    /// Human-facing label used as the message title.
    pub fn label(self) -> &'static str {
        match self {
            DynamicKind::Word | DynamicKind::Draw | DynamicKind::Other => "posted an update",
            DynamicKind::Video => "uploaded a video",
            DynamicKind::Forward => "reposted an update",
            DynamicKind::SharedLive => "shared a live room",
            DynamicKind::Article => "published an article",
            DynamicKind::Music => "uploaded an audio",
            DynamicKind::Pgc | DynamicKind::LiveRcmd => "",
        }
    }

    pub fn is_live_announcement(self) -> bool {
        matches!(self, DynamicKind::LiveRcmd)
    }
}

/// Normalized view of one dynamic item, transient per poll.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicInfo {
    pub kind: DynamicKind,
    pub id: String,
    pub text: String,
    pub images: Vec<String>,
    pub author: String,
    pub link: String,
    /// Publish time, unix seconds.
    pub ts: i64,
}

/// Classify one raw item. `None` means suppressed: an unparseable live
/// announcement, a repost whose original is suppressed, or input nested
/// beyond [`MAX_FORWARD_DEPTH`]. Every other input maps to some record,
/// however generic.
pub fn parse_dynamic(item: &Value, depth: usize) -> Option<DynamicInfo> {
    if depth >= MAX_FORWARD_DEPTH {
        return None;
    }

    let id = json::str_at(item, "id_str");
    let mut info = DynamicInfo {
        kind: DynamicKind::Other,
        link: format!("{DYNAMIC_URL_PREFIX}{id}"),
        id,
        text: String::new(),
        images: Vec::new(),
        author: json::str_at(item, "modules.module_author.name"),
        ts: json::i64_at(item, "modules.module_author.pub_ts"),
    };

    let dynamic = json::at(item, "modules.module_dynamic");
    match json::str_at(item, "type").as_str() {
        TYPE_WORD => {
            info.kind = DynamicKind::Word;
            info.text = json::str_at(dynamic, "desc.text");
        }
        TYPE_DRAW => {
            info.kind = DynamicKind::Draw;
            info.text = json::str_at(dynamic, "desc.text");
            for img in json::array_at(dynamic, "major.draw.items") {
                info.images.push(json::str_at(img, "src"));
            }
        }
        TYPE_AV => {
            info.kind = DynamicKind::Video;
            let archive = json::at(dynamic, "major.archive");
            info.id = json::str_at(archive, "bvid");
            info.link = format!("{VIDEO_URL_PREFIX}{}", info.id);
            info.text = format!(
                "{}\n{}",
                json::str_at(archive, "title"),
                json::str_at(archive, "desc")
            );
            info.images = vec![json::str_at(archive, "cover")];
        }
        TYPE_FORWARD => {
            let commentary = json::str_at(dynamic, "desc.text");
            let orig = json::at(item, "orig");
            let orig_info = parse_dynamic(orig, depth + 1)?;
            if orig_info.kind.is_live_announcement() {
                info.kind = DynamicKind::SharedLive;
                info.text = format!(
                    "{}\nshared \"{}\"'s live room\n{}",
                    commentary, orig_info.author, orig_info.text
                );
            } else {
                info.kind = DynamicKind::Forward;
                info.text = format!(
                    "{} \nreposted from: @{}\n{}",
                    commentary, orig_info.author, orig_info.text
                );
            }
            info.images = orig_info.images;
        }
        TYPE_ARTICLE => {
            info.kind = DynamicKind::Article;
            let article = json::at(dynamic, "major.article");
            info.id = json::i64_at(article, "id").to_string();
            info.link = format!("{ARTICLE_URL_PREFIX}{}", info.id);
            info.text = format!(
                "{}\n{}",
                json::str_at(article, "title"),
                json::str_at(article, "desc")
            );
            info.images = vec![json::str_at(article, "covers.0")];
        }
        TYPE_MUSIC => {
            info.kind = DynamicKind::Music;
            let music = json::at(dynamic, "major.music");
            info.id = json::i64_at(music, "id").to_string();
            info.link = format!("{MUSIC_URL_PREFIX}{}", info.id);
            info.text = json::str_at(music, "title");
            info.images = vec![json::str_at(music, "cover")];
        }
        TYPE_PGC => {
            info.kind = DynamicKind::Pgc;
            info.text = json::str_at(dynamic, "major.pgc.title");
            info.images = vec![json::str_at(dynamic, "major.pgc.cover")];
        }
        TYPE_LIVE_RCMD => {
            info.kind = DynamicKind::LiveRcmd;
            // The announcement payload is JSON re-encoded as a string.
            let content = json::str_at(dynamic, "major.live_rcmd.content");
            if content.is_empty() {
                return None;
            }
            let live: Value = serde_json::from_str(&content).ok()?;
            info.text = format!(
                "title: \"{}\"",
                json::str_at(&live, "live_play_info.title")
            );
            info.images = vec![json::str_at(&live, "live_play_info.cover")];
        }
        _ => {
            info.text = "unhandled dynamic type".to_string();
        }
    }
    Some(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(types: &str, dynamic: Value) -> Value {
        json!({
            "type": types,
            "id_str": "111",
            "modules": {
                "module_author": {"name": "Alice", "pub_ts": 1_700_000_000},
                "module_dynamic": dynamic,
            },
        })
    }

    #[test]
    fn word_post_keeps_text_only() {
        let it = item(TYPE_WORD, json!({"desc": {"text": "Hi"}}));
        let info = parse_dynamic(&it, 0).unwrap();
        assert_eq!(info.kind, DynamicKind::Word);
        assert_eq!(info.text, "Hi");
        assert!(info.images.is_empty());
        assert_eq!(info.link, "https://t.bilibili.com/111");
        assert_eq!(info.author, "Alice");
        assert_eq!(info.ts, 1_700_000_000);
    }

    #[test]
    fn draw_post_collects_image_urls() {
        let it = item(
            TYPE_DRAW,
            json!({
                "desc": {"text": "pics"},
                "major": {"draw": {"items": [{"src": "a.jpg"}, {"src": "b.jpg"}]}},
            }),
        );
        let info = parse_dynamic(&it, 0).unwrap();
        assert_eq!(info.kind, DynamicKind::Draw);
        assert_eq!(info.images, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn video_remaps_id_to_bvid() {
        let it = item(
            TYPE_AV,
            json!({
                "major": {"archive": {
                    "bvid": "BV1xx",
                    "title": "t",
                    "desc": "d",
                    "cover": "c.jpg",
                }},
            }),
        );
        let info = parse_dynamic(&it, 0).unwrap();
        assert_eq!(info.id, "BV1xx");
        assert_eq!(info.link, "https://www.bilibili.com/video/BV1xx");
        assert_eq!(info.text, "t\nd");
        assert_eq!(info.images, vec!["c.jpg"]);
    }

    #[test]
    fn article_remaps_id_and_takes_first_cover() {
        let it = item(
            TYPE_ARTICLE,
            json!({
                "major": {"article": {
                    "id": 987,
                    "title": "t",
                    "desc": "d",
                    "covers": ["x.jpg", "y.jpg"],
                }},
            }),
        );
        let info = parse_dynamic(&it, 0).unwrap();
        assert_eq!(info.id, "987");
        assert_eq!(info.link, "https://www.bilibili.com/read/cv987");
        assert_eq!(info.images, vec!["x.jpg"]);
    }

    #[test]
    fn music_maps_title_and_cover() {
        let it = item(
            TYPE_MUSIC,
            json!({"major": {"music": {"id": 55, "title": "song", "cover": "m.jpg"}}}),
        );
        let info = parse_dynamic(&it, 0).unwrap();
        assert_eq!(info.id, "55");
        assert_eq!(info.link, "https://www.bilibili.com/audio/au55");
        assert_eq!(info.text, "song");
        assert_eq!(info.images, vec!["m.jpg"]);
    }

    #[test]
    fn pgc_has_no_label() {
        let it = item(TYPE_PGC, json!({"major": {"pgc": {"title": "ep", "cover": "p.jpg"}}}));
        let info = parse_dynamic(&it, 0).unwrap();
        assert_eq!(info.kind, DynamicKind::Pgc);
        assert_eq!(info.kind.label(), "");
        assert_eq!(info.text, "ep");
    }

    #[test]
    fn live_rcmd_parses_embedded_payload() {
        let content = json!({"live_play_info": {"title": "hello", "cover": "c.jpg"}}).to_string();
        let it = item(
            TYPE_LIVE_RCMD,
            json!({"major": {"live_rcmd": {"content": content}}}),
        );
        let info = parse_dynamic(&it, 0).unwrap();
        assert!(info.kind.is_live_announcement());
        assert_eq!(info.text, "title: \"hello\"");
        assert_eq!(info.images, vec!["c.jpg"]);
    }

    #[test]
    fn live_rcmd_with_empty_payload_is_suppressed() {
        let it = item(TYPE_LIVE_RCMD, json!({"major": {"live_rcmd": {}}}));
        assert_eq!(parse_dynamic(&it, 0), None);

        let it = item(
            TYPE_LIVE_RCMD,
            json!({"major": {"live_rcmd": {"content": "not json"}}}),
        );
        assert_eq!(parse_dynamic(&it, 0), None);
    }

    #[test]
    fn forward_of_word_post_wording() {
        let orig = item(TYPE_WORD, json!({"desc": {"text": "Hi"}}));
        let mut it = item(TYPE_FORWARD, json!({"desc": {"text": "check this out"}}));
        it["id_str"] = json!("222");
        it["orig"] = orig;
        let info = parse_dynamic(&it, 0).unwrap();
        assert_eq!(info.kind, DynamicKind::Forward);
        assert_eq!(info.text, "check this out \nreposted from: @Alice\nHi");
        assert_eq!(info.link, "https://t.bilibili.com/222");
    }

    #[test]
    fn forward_of_live_announcement_wording() {
        let content = json!({"live_play_info": {"title": "live!", "cover": "c.jpg"}}).to_string();
        let orig = item(
            TYPE_LIVE_RCMD,
            json!({"major": {"live_rcmd": {"content": content}}}),
        );
        let mut it = item(TYPE_FORWARD, json!({"desc": {"text": "come watch"}}));
        it["orig"] = orig;
        let info = parse_dynamic(&it, 0).unwrap();
        assert_eq!(info.kind, DynamicKind::SharedLive);
        assert_eq!(
            info.text,
            "come watch\nshared \"Alice\"'s live room\ntitle: \"live!\""
        );
        // Images come from the original.
        assert_eq!(info.images, vec!["c.jpg"]);
    }

    #[test]
    fn forward_of_suppressed_original_is_suppressed() {
        let orig = item(TYPE_LIVE_RCMD, json!({"major": {"live_rcmd": {}}}));
        let mut it = item(TYPE_FORWARD, json!({"desc": {"text": "c"}}));
        it["orig"] = orig;
        assert_eq!(parse_dynamic(&it, 0), None);
    }

    #[test]
    fn forward_of_missing_original_falls_back_generic() {
        // No `orig` field at all: the nested pass sees an empty item and
        // classifies it with the fallback case rather than failing.
        let it = item(TYPE_FORWARD, json!({"desc": {"text": "c"}}));
        let info = parse_dynamic(&it, 0).unwrap();
        assert_eq!(info.kind, DynamicKind::Forward);
        assert!(info.text.contains("unhandled dynamic type"));
    }

    #[test]
    fn unknown_type_never_fails() {
        let it = item("DYNAMIC_TYPE_SOMETHING_NEW", json!({}));
        let info = parse_dynamic(&it, 0).unwrap();
        assert_eq!(info.kind, DynamicKind::Other);
        assert_eq!(info.kind.label(), "posted an update");
        assert_eq!(info.text, "unhandled dynamic type");
    }

    #[test]
    fn recursion_depth_is_capped() {
        let mut inner = item(TYPE_FORWARD, json!({"desc": {"text": "inner"}}));
        inner["orig"] = item(TYPE_WORD, json!({"desc": {"text": "deep"}}));
        let mut outer = item(TYPE_FORWARD, json!({"desc": {"text": "outer"}}));
        outer["orig"] = inner;
        // forward-of-forward exceeds the schema's one nested level
        assert_eq!(parse_dynamic(&outer, 0), None);
    }
}
