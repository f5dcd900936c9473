use serde::{Deserialize, Serialize};

/// The four ways a player can answer a threat
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Interrupt,
    Dodge,
    Defend,
    Burst,
}

impl Category {
    /// Order matches the on-screen controls and the 1-4 keys
    pub const ALL: [Category; 4] = [
        Category::Interrupt,
        Category::Dodge,
        Category::Defend,
        Category::Burst,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Interrupt => "打断",
            Category::Dodge => "闪避",
            Category::Defend => "减伤",
            Category::Burst => "爆发",
        }
    }

    /// Skills a player would press for this category
    pub fn response_label(&self) -> &'static str {
        match self {
            Category::Interrupt => "打断/剑飞",
            Category::Dodge => "后跳/小轻功",
            Category::Defend => "减伤/御",
            Category::Burst => "爆发/紫气",
        }
    }

    /// 1-based control index
    pub fn from_index(idx: usize) -> Option<Category> {
        idx.checked_sub(1)
            .and_then(|i| Category::ALL.get(i))
            .copied()
    }

    pub fn index(&self) -> usize {
        Category::ALL
            .iter()
            .position(|c| c == self)
            .map_or(0, |i| i + 1)
    }

    /// Parse the lowercase form used in the reaction log
    pub fn parse(s: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.to_string() == s)
    }
}

/// A catalog entry: something the boss or an opponent does
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Threat {
    pub category: Category,
    pub name: &'static str,
    pub description: &'static str,
    /// Nominal time to react before the threat lands
    pub base_window_ms: u64,
}

const fn threat(
    category: Category,
    name: &'static str,
    description: &'static str,
    base_window_ms: u64,
) -> Threat {
    Threat {
        category,
        name,
        description,
        base_window_ms,
    }
}

pub static THREATS: &[Threat] = &[
    threat(Category::Interrupt, "七星拱瑞", "气纯读条控制，快打断！", 1500),
    threat(Category::Interrupt, "兰摧玉折", "万花读条上毒，不可不防", 1500),
    threat(Category::Interrupt, "吞日月", "剑纯插旗封轻功，必须打断", 1200),
    threat(Category::Interrupt, "玳弦急曲", "冰心持续封内，打断它", 1500),
    threat(Category::Interrupt, "恐怖读条", "BOSS释放全屏秒杀技", 1800),
    threat(Category::Dodge, "断魂刺", "天策骑马踩过来了！后跳！", 1000),
    threat(Category::Dodge, "醉月", "藏剑贴脸，预判眩晕！", 800),
    threat(Category::Dodge, "五方行尽", "气纯捉影定身，快躲开", 1200),
    threat(Category::Dodge, "生死劫", "明教隐身突进，满魂控制", 900),
    threat(Category::Dodge, "红圈点名", "脚下出现岩浆，快走位！", 1200),
    threat(Category::Defend, "风来吴山", "藏剑大风车！伤害爆炸！", 2000),
    threat(Category::Defend, "追命箭", "唐门百里之外读条大招", 1500),
    threat(Category::Defend, "坚壁清野", "霸刀铺地毯，持续高伤", 1500),
    threat(Category::Defend, "乱洒青荷", "万花爆发全开，玉石俱焚", 1200),
    threat(Category::Defend, "全屏AOE", "BOSS狂暴，准备承伤", 2000),
    threat(Category::Burst, "免控结束", "对方无解控，抓紧输出！", 2500),
    threat(Category::Burst, "坐忘无我破", "气纯蛋壳破了，集火！", 2000),
    threat(Category::Burst, "虚弱状态", "BOSS护盾破碎，全力爆发", 3000),
    threat(Category::Burst, "听雷空了", "对方技能真空期，反打", 2000),
];

#[cfg(test)]
pub fn find_threat(name: &str) -> Option<&'static Threat> {
    THREATS.iter().find(|t| t.name == name)
}
