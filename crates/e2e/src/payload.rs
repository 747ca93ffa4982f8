//! Render request payloads
//!
//! Requests are built from fixed sample data. Field names and numeric
//! types follow the service contract exactly: the upstream API mixes
//! snake_case (`user_id`, `join_time`) and camelCase (`groupId`,
//! `lastSpeakTime`) keys, ids are integers where the renderer expects
//! numbers, and `join_time` / `last_sent_time` are millisecond epochs.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// Quality sent as `screenshotQuality` unless configured otherwise
pub const DEFAULT_SCREENSHOT_QUALITY: u8 = 90;

/// Named font preset selecting how the rendered image looks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageStyle {
    #[serde(rename = "思源宋体SourceHanSerifSC")]
    SourceHanSerifSc,
    #[serde(rename = "落霞孤鹜文楷LXGWWenKai")]
    LxgwWenkai,
}

impl ImageStyle {
    pub const ALL: [ImageStyle; 2] = [ImageStyle::SourceHanSerifSc, ImageStyle::LxgwWenkai];

    /// Stable key used in artifact file names
    pub fn key(&self) -> &'static str {
        match self {
            ImageStyle::SourceHanSerifSc => "source_han_serif_sc",
            ImageStyle::LxgwWenkai => "lxgw_wenkai",
        }
    }

    /// Value sent as `imageStyle`
    pub fn wire_name(&self) -> &'static str {
        match self {
            ImageStyle::SourceHanSerifSc => "思源宋体SourceHanSerifSC",
            ImageStyle::LxgwWenkai => "落霞孤鹜文楷LXGWWenKai",
        }
    }
}

impl fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key(), self.wire_name())
    }
}

/// Output format. Serialized lowercase, accepted in any case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    #[default]
    Png,
    Jpg,
    Jpeg,
    Webp,
}

impl ImageType {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageType::Png => "png",
            ImageType::Jpg => "jpg",
            ImageType::Jpeg => "jpeg",
            ImageType::Webp => "webp",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "png" => Some(ImageType::Png),
            "jpg" => Some(ImageType::Jpg),
            "jpeg" => Some(ImageType::Jpeg),
            "webp" => Some(ImageType::Webp),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for ImageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        ImageType::parse(&value)
            .ok_or_else(|| de::Error::unknown_variant(&value, &["png", "jpg", "jpeg", "webp"]))
    }
}

/// Which image-generating endpoint a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderKind {
    UserInfo,
    AdminList,
}

impl RenderKind {
    pub const ALL: [RenderKind; 2] = [RenderKind::UserInfo, RenderKind::AdminList];

    pub fn path(&self) -> &'static str {
        match self {
            RenderKind::UserInfo => "/render-user-info",
            RenderKind::AdminList => "/render-admin-list",
        }
    }

    /// Case name used as the artifact file name prefix
    pub fn case_name(&self) -> &'static str {
        match self {
            RenderKind::UserInfo => "userinfo",
            RenderKind::AdminList => "adminlist",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RenderKind::UserInfo => "render-user-info",
            RenderKind::AdminList => "render-admin-list",
        }
    }
}

/// A single group member as the user-info renderer expects it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: String,
    pub nickname: String,
    pub avatar: String,
    pub level: u32,
    pub exp: u32,
    #[serde(rename = "lastSpeakTime")]
    pub last_speak_time_iso: String,
    #[serde(rename = "joinTime")]
    pub join_time_iso: String,
    #[serde(rename = "speakCount")]
    pub speak_count: u32,
    pub card: String,
    pub group_level: String,
    pub title: String,
    /// Milliseconds since the epoch
    pub last_sent_time: i64,
    /// Milliseconds since the epoch
    pub join_time: i64,
    pub qq_level: u32,
    pub q_id: String,
    #[serde(rename = "eMail")]
    pub email: String,
    #[serde(rename = "phoneNum")]
    pub phone_num: String,
    pub address: String,
    pub country: String,
    pub province: String,
    pub city: String,
    #[serde(rename = "shengXiao")]
    pub sheng_xiao: u8,
    pub constellation: u8,
    pub birthday_year: u16,
    pub birthday_month: u8,
    pub birthday_day: u8,
    pub is_vip: bool,
    pub is_years_vip: bool,
    pub vip_level: u32,
    pub status: u32,
    pub sex: String,
    pub age: u32,
    pub reg_time: i64,
    pub long_nick: String,
    pub role: String,
}

/// One entry of the admin list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminInfo {
    pub user_id: i64,
    pub nickname: String,
    pub avatar: String,
    pub role: String,
    pub card: String,
}

/// Group metadata shared by both render kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextInfo {
    pub is_group: bool,
    pub group_id: i64,
    pub group_name: String,
    pub group_avatar: String,
    pub member_count: u32,
    pub max_member_count: u32,
    pub onebot_impl: String,
}

/// Exactly one of `userInfo` / `admins` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderSubject {
    #[serde(rename = "userInfo")]
    UserInfo(UserInfo),
    #[serde(rename = "admins")]
    Admins(Vec<AdminInfo>),
}

impl RenderSubject {
    pub fn kind(&self) -> RenderKind {
        match self {
            RenderSubject::UserInfo(_) => RenderKind::UserInfo,
            RenderSubject::Admins(_) => RenderKind::AdminList,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub image_style: ImageStyle,
    pub enable_dark_mode: bool,
    pub image_type: ImageType,
    pub screenshot_quality: u8,
}

impl RenderOptions {
    pub fn new(image_style: ImageStyle, enable_dark_mode: bool) -> Self {
        Self {
            image_style,
            enable_dark_mode,
            image_type: ImageType::default(),
            screenshot_quality: DEFAULT_SCREENSHOT_QUALITY,
        }
    }
}

/// Body of a POST to one of the render endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    #[serde(flatten)]
    pub subject: RenderSubject,
    pub context_info: ContextInfo,
    #[serde(flatten)]
    pub options: RenderOptions,
}

impl RenderRequest {
    pub fn kind(&self) -> RenderKind {
        self.subject.kind()
    }

    pub fn style(&self) -> ImageStyle {
        self.options.image_style
    }
}

/// Build the request for a kind with the given options
pub fn build_request(kind: RenderKind, options: RenderOptions) -> RenderRequest {
    let subject = match kind {
        RenderKind::UserInfo => RenderSubject::UserInfo(sample_user()),
        RenderKind::AdminList => RenderSubject::Admins(sample_admins()),
    };
    RenderRequest {
        subject,
        context_info: sample_context(),
        options,
    }
}

/// Build the request for a (kind, style, dark mode) permutation with default
/// type and quality
pub fn build(kind: RenderKind, style: ImageStyle, dark_mode: bool) -> RenderRequest {
    build_request(kind, RenderOptions::new(style, dark_mode))
}

pub fn sample_context() -> ContextInfo {
    ContextInfo {
        is_group: true,
        group_id: 987654321,
        group_name: "OneBot API 测试群".to_string(),
        group_avatar: "https://p.qlogo.cn/gh/987654321/987654321/640/".to_string(),
        member_count: 150,
        max_member_count: 200,
        onebot_impl: "NapCat".to_string(),
    }
}

pub fn sample_user() -> UserInfo {
    UserInfo {
        user_id: "123456789".to_string(),
        nickname: "测试用户".to_string(),
        avatar: avatar_url(123456789),
        level: 15,
        exp: 8500,
        last_speak_time_iso: "2024-01-15T10:30:00Z".to_string(),
        join_time_iso: "2023-06-01T08:00:00Z".to_string(),
        speak_count: 1250,
        card: "群管理员".to_string(),
        group_level: "18".to_string(),
        title: "活跃用户".to_string(),
        last_sent_time: 1_705_312_200_000,
        join_time: 1_685_577_600_000,
        qq_level: 64,
        q_id: "qid_test_123456789".to_string(),
        email: "test@example.com".to_string(),
        phone_num: "138****8888".to_string(),
        address: "北京市朝阳区某某街道".to_string(),
        country: "中国".to_string(),
        province: "北京".to_string(),
        city: "北京市".to_string(),
        sheng_xiao: 3,
        constellation: 7,
        birthday_year: 1995,
        birthday_month: 8,
        birthday_day: 15,
        is_vip: true,
        is_years_vip: false,
        vip_level: 6,
        status: 10,
        sex: "male".to_string(),
        age: 28,
        reg_time: 1_234_567_890,
        long_nick: "这是一个测试用户的个性签名，用于展示API功能".to_string(),
        role: "admin".to_string(),
    }
}

pub fn sample_admins() -> Vec<AdminInfo> {
    [
        (111111111, "群主大大", "owner", "至高无上的群主"),
        (222222222, "管理员小助手", "admin", "贴心小管家"),
        (333333333, "技术管理", "admin", "代码搬运工"),
        (444444444, "活动管理", "admin", "活动策划师"),
    ]
    .into_iter()
    .map(|(user_id, nickname, role, card)| AdminInfo {
        user_id,
        nickname: nickname.to_string(),
        avatar: avatar_url(user_id),
        role: role.to_string(),
        card: card.to_string(),
    })
    .collect()
}

fn avatar_url(user_id: i64) -> String {
    format!("https://q1.qlogo.cn/g?b=qq&nk={}&s=640", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use test_case::test_case;

    #[test]
    fn test_user_info_wire_shape() {
        let request = build(RenderKind::UserInfo, ImageStyle::LxgwWenkai, false);
        let value = serde_json::to_value(&request).unwrap();

        let user = &value["userInfo"];
        assert_eq!(user["user_id"], Value::from("123456789"));
        assert_eq!(user["join_time"], Value::from(1_685_577_600_000i64));
        assert_eq!(user["lastSpeakTime"], Value::from("2024-01-15T10:30:00Z"));
        assert_eq!(user["eMail"], Value::from("test@example.com"));
        assert!(user.get("email").is_none());
        assert_eq!(value["contextInfo"]["groupId"], Value::from(987654321));
        assert_eq!(value["imageStyle"], Value::from("落霞孤鹜文楷LXGWWenKai"));
    }

    #[test]
    fn test_admin_list_wire_shape() {
        let request = build(RenderKind::AdminList, ImageStyle::SourceHanSerifSc, true);
        let value = serde_json::to_value(&request).unwrap();

        let admins = value["admins"].as_array().unwrap();
        assert_eq!(admins.len(), 4);
        assert!(admins[0]["user_id"].is_i64());
        assert_eq!(admins[0]["role"], Value::from("owner"));
        assert_eq!(value["enableDarkMode"], Value::Bool(true));
        assert_eq!(request.kind(), RenderKind::AdminList);
    }

    #[test]
    fn test_request_key_order_matches_contract() {
        let request = build(RenderKind::UserInfo, ImageStyle::SourceHanSerifSc, false);
        let json = serde_json::to_string(&request).unwrap();
        let positions: Vec<usize> = [
            "\"userInfo\"",
            "\"contextInfo\"",
            "\"imageStyle\"",
            "\"enableDarkMode\"",
            "\"imageType\"",
            "\"screenshotQuality\"",
        ]
        .iter()
        .map(|key| json.find(key).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_request_parses_back() {
        let request = build(RenderKind::AdminList, ImageStyle::LxgwWenkai, false);
        let json = serde_json::to_string(&request).unwrap();
        let parsed: RenderRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn test_image_type_parse() {
        assert_eq!(ImageType::parse("PNG"), Some(ImageType::Png));
        assert_eq!(ImageType::parse("jpeg").map(|t| t.extension()), Some("jpeg"));
        assert_eq!(ImageType::parse("gif"), None);
    }

    #[test]
    fn test_image_type_decodes_any_case() {
        let parsed: Vec<ImageType> = serde_json::from_str(r#"["PNG","Jpeg","webp"]"#).unwrap();
        assert_eq!(parsed, vec![ImageType::Png, ImageType::Jpeg, ImageType::Webp]);
        assert!(serde_json::from_str::<ImageType>(r#""gif""#).is_err());
        assert_eq!(serde_json::to_value(ImageType::Webp).unwrap(), Value::from("webp"));
    }

    #[test_case(RenderKind::UserInfo, ImageStyle::SourceHanSerifSc ; "userinfo source han serif")]
    #[test_case(RenderKind::UserInfo, ImageStyle::LxgwWenkai ; "userinfo lxgw wenkai")]
    #[test_case(RenderKind::AdminList, ImageStyle::SourceHanSerifSc ; "adminlist source han serif")]
    #[test_case(RenderKind::AdminList, ImageStyle::LxgwWenkai ; "adminlist lxgw wenkai")]
    fn test_every_permutation_carries_all_options(kind: RenderKind, style: ImageStyle) {
        let value = serde_json::to_value(build(kind, style, false)).unwrap();

        assert_eq!(value["imageStyle"], Value::from(style.wire_name()));
        assert_eq!(value["enableDarkMode"], Value::Bool(false));
        assert_eq!(value["imageType"], Value::from("png"));
        assert_eq!(value["screenshotQuality"], Value::from(DEFAULT_SCREENSHOT_QUALITY));
        assert!(value["contextInfo"].is_object());
        assert_eq!(value.get("userInfo").is_some(), kind == RenderKind::UserInfo);
        assert_eq!(value.get("admins").is_some(), kind == RenderKind::AdminList);
    }
}
