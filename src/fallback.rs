use chrono::{DateTime, Utc};

use crate::models::BlogPost;
use crate::scraper::DEFAULT_AUTHOR;

const SITE_URL: &str = "https://www.example.com";

struct Sample {
    slug: &'static str,
    title: &'static str,
    excerpt: &'static str,
    body: &'static str,
    date: &'static str,
    image: &'static str,
    categories: &'static [&'static str],
    tags: &'static [&'static str],
    minutes: u32,
}

const SAMPLES: [Sample; 5] = [
    Sample {
        slug: "las-vegas-real-estate-market-update-january-2025",
        title: "Las Vegas Real Estate Market Update: January 2025",
        excerpt: "Inventory is up, rates are easing and buyers are back. Here is what the new year looks like across the valley.",
        body: "<p>Inventory across the Las Vegas valley climbed for the third straight month while median prices held steady. Buyers who paused last fall are returning as mortgage rates ease.</p><p>Sellers should price realistically and invest in presentation; well-staged homes are still going under contract within a few weeks.</p>",
        date: "2025-01-15T16:00:00Z",
        image: "/images/blog/market-update-january-2025.jpg",
        categories: &["Market Updates"],
        tags: &["las vegas", "market report", "2025"],
        minutes: 4,
    },
    Sample {
        slug: "first-time-home-buyer-guide-las-vegas",
        title: "The First-Time Home Buyer's Guide to Las Vegas",
        excerpt: "From pre-approval to closing day, a step-by-step walkthrough for buying your first home in Southern Nevada.",
        body: "<p>Buying your first home starts long before the first showing. Get pre-approved, learn which down payment assistance programs you qualify for and decide which neighborhoods fit your commute.</p><p>Once you are under contract, schedule inspections early and keep your finances steady until closing.</p>",
        date: "2025-01-08T16:00:00Z",
        image: "/images/blog/first-time-buyer-guide.jpg",
        categories: &["Buying"],
        tags: &["first-time buyers", "financing"],
        minutes: 6,
    },
    Sample {
        slug: "selling-your-home-in-henderson",
        title: "Selling Your Home in Henderson: What to Expect",
        excerpt: "Pricing, prep and timing advice for Henderson homeowners thinking about listing this year.",
        body: "<p>Henderson remains one of the most requested areas in the valley. Homes near parks and top-rated schools draw multiple offers when they are priced to the market.</p><p>A pre-listing inspection and a few targeted repairs often pay for themselves at the negotiating table.</p>",
        date: "2024-12-18T16:00:00Z",
        image: "/images/blog/selling-henderson.jpg",
        categories: &["Selling"],
        tags: &["henderson", "listing tips"],
        minutes: 5,
    },
    Sample {
        slug: "best-neighborhoods-for-families-in-summerlin",
        title: "Best Neighborhoods for Families in Summerlin",
        excerpt: "Parks, trails and schools: a tour of the Summerlin villages families ask about most.",
        body: "<p>Summerlin's master-planned villages offer miles of trails, community pools and easy access to Red Rock Canyon.</p><p>Families tend to favor The Ridges, Stonebridge and Reverence for their parks and newer construction.</p>",
        date: "2024-12-04T16:00:00Z",
        image: "/images/blog/summerlin-neighborhoods.jpg",
        categories: &["Neighborhoods"],
        tags: &["summerlin", "families"],
        minutes: 5,
    },
    Sample {
        slug: "how-to-prepare-for-an-open-house",
        title: "How to Prepare Your Home for an Open House",
        excerpt: "A simple checklist to make your open house count, from curb appeal to the final walkthrough.",
        body: "<p>Declutter every room, open the blinds and make sure the entry is spotless. First impressions start at the curb.</p><p>Secure valuables and medications, and plan to be away during the event so buyers can picture themselves at home.</p>",
        date: "2024-11-20T16:00:00Z",
        image: "/images/blog/open-house-prep.jpg",
        categories: &["Selling"],
        tags: &["open house", "staging"],
        minutes: 3,
    },
];

/// Illustrative posts shown when neither the API nor the blog page is
/// reachable. Always the same five entries in the same order.
pub fn sample_posts() -> Vec<BlogPost> {
    SAMPLES
        .iter()
        .enumerate()
        .map(|(index, sample)| BlogPost {
            id: format!("sample-{}", index + 1),
            title: sample.title.to_string(),
            slug: sample.slug.to_string(),
            content: sample.body.to_string(),
            excerpt: sample.excerpt.to_string(),
            date: DateTime::parse_from_rfc3339(sample.date)
                .map(|date| date.with_timezone(&Utc))
                .unwrap_or_default(),
            author: DEFAULT_AUTHOR.to_string(),
            image: Some(format!("{}{}", SITE_URL, sample.image)),
            image_alt: Some(sample.title.to_string()),
            original_url: format!("{}/blog/{}", SITE_URL, sample.slug),
            categories: sample.categories.iter().map(|c| c.to_string()).collect(),
            tags: sample.tags.iter().map(|t| t.to_string()).collect(),
            reading_time: Some(sample.minutes),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sample_set_is_fixed() {
        let posts = sample_posts();
        assert_eq!(posts.len(), 5);
        assert_eq!(posts, sample_posts());
        assert!(posts
            .iter()
            .any(|p| p.slug == "las-vegas-real-estate-market-update-january-2025"));
    }

    #[test]
    fn samples_have_unique_slugs_and_titles() {
        let posts = sample_posts();
        let slugs: HashSet<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs.len(), posts.len());
        assert!(posts.iter().all(|p| !p.title.is_empty()));
        assert!(posts.iter().all(|p| p.date.timestamp() > 0));
    }
}
