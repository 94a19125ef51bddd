//! List query planning
//!
//! A [`QueryPlan`] is plain data: a search needle, an ordering with an `id`
//! tie-break, and an offset/limit window. It can be evaluated in memory with
//! [`QueryPlan::evaluate`] or translated to SQL by a repository.

use std::cmp::Ordering;

use crate::models::{Contact, ListRequest};

/// Page size used when the request asks for zero or fewer rows.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest page a request may ask for.
pub const MAX_PAGE_SIZE: i64 = 200;

/// Sortable contact fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    DateOfBirth,
    Married,
    Phone,
    Salary,
}

impl SortField {
    /// Case-insensitive lookup of a column name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "name" => Some(Self::Name),
            "dateofbirth" => Some(Self::DateOfBirth),
            "married" => Some(Self::Married),
            "phone" => Some(Self::Phone),
            "salary" => Some(Self::Salary),
            _ => None,
        }
    }

    pub fn to_sql_column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::DateOfBirth => "date_of_birth",
            Self::Married => "married",
            Self::Phone => "phone",
            Self::Salary => "salary_cents",
        }
    }

    fn compare(&self, a: &Contact, b: &Contact) -> Ordering {
        match self {
            Self::Name => a.name.cmp(&b.name),
            Self::DateOfBirth => a.date_of_birth.cmp(&b.date_of_birth),
            Self::Married => a.married.cmp(&b.married),
            Self::Phone => a.phone.cmp(&b.phone),
            Self::Salary => a.salary.cmp(&b.salary),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// Ordering of a plan. Every variant ends with `id ASC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Field(SortField, SortOrder),
    /// Newest created first.
    NewestFirst,
}

impl OrderBy {
    pub fn compare(&self, a: &Contact, b: &Contact) -> Ordering {
        let primary = match self {
            Self::Field(field, order) => order.apply(field.compare(a, b)),
            Self::NewestFirst => b.created_at.cmp(&a.created_at),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }

    /// `ORDER BY` body; column names come from a fixed whitelist.
    pub fn to_sql(&self) -> String {
        match self {
            Self::Field(field, order) => {
                format!("{} {}, id ASC", field.to_sql_column(), order.to_sql())
            }
            Self::NewestFirst => "created_at DESC, id ASC".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    /// Lowercased needle matched against name or phone.
    pub search: Option<String>,
    pub order: OrderBy,
    pub offset: u64,
    pub limit: u64,
}

/// Counts plus the page of rows a plan produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPage {
    pub records_total: u64,
    pub records_filtered: u64,
    pub rows: Vec<Contact>,
}

impl QueryPlan {
    /// Build a plan from a request that already passed validation.
    ///
    /// Only the first sort directive is honoured. Unresolvable columns fall
    /// back to [`OrderBy::NewestFirst`].
    pub fn from_request(request: &ListRequest) -> Self {
        let search = request
            .search_value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let order = request
            .order
            .first()
            .and_then(|directive| {
                let column = usize::try_from(directive.column).ok()?;
                let field = SortField::parse(request.columns.get(column)?.field()?)?;
                let order = if directive.dir.trim().eq_ignore_ascii_case("desc") {
                    SortOrder::Desc
                } else {
                    SortOrder::Asc
                };
                Some(OrderBy::Field(field, order))
            })
            .unwrap_or(OrderBy::NewestFirst);

        let limit = u64::try_from(request.length)
            .ok()
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self {
            search,
            order,
            offset: u64::try_from(request.start).unwrap_or(0),
            limit,
        }
    }

    pub fn matches(&self, contact: &Contact) -> bool {
        match &self.search {
            Some(needle) => {
                contact.search_name().contains(needle.as_str())
                    || contact.search_phone().contains(needle.as_str())
            }
            None => true,
        }
    }

    /// Evaluate the plan over an unfiltered set of contacts.
    pub fn evaluate<I>(&self, contacts: I) -> QueryPage
    where
        I: IntoIterator<Item = Contact>,
    {
        let mut records_total = 0u64;
        let mut filtered: Vec<Contact> = Vec::new();
        for contact in contacts {
            records_total += 1;
            if self.matches(&contact) {
                filtered.push(contact);
            }
        }

        filtered.sort_by(|a, b| self.order.compare(a, b));
        let records_filtered = filtered.len() as u64;

        let rows = filtered
            .into_iter()
            .skip(usize::try_from(self.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .collect();

        QueryPage {
            records_total,
            records_filtered,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnDescriptor, SortDirective};
    use chrono::{Duration, NaiveDate};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn columns() -> Vec<ColumnDescriptor> {
        ["name", "dateOfBirth", "married", "phone", "salary"]
            .into_iter()
            .map(ColumnDescriptor::data)
            .collect()
    }

    fn contact(name: &str, phone: &str, salary: i64, age_rank: i64) -> Contact {
        let mut c = Contact::new(
            name,
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            salary % 2 == 0,
            phone,
            Decimal::new(salary, 0),
        );
        c.created_at = c.created_at - Duration::minutes(age_rank);
        c
    }

    fn sample() -> Vec<Contact> {
        vec![
            contact("Carol", "555-0003", 300, 3),
            contact("alice", "555-0001", 100, 1),
            contact("Bob", "555-0002", 200, 2),
            contact("Dave", "777-0004", 200, 4),
        ]
    }

    fn request(length: i64) -> ListRequest {
        ListRequest {
            draw: 1,
            start: 0,
            length,
            columns: columns(),
            ..Default::default()
        }
    }

    #[test]
    fn test_non_positive_length_uses_default() {
        assert_eq!(QueryPlan::from_request(&request(0)).limit, DEFAULT_PAGE_SIZE);
        assert_eq!(QueryPlan::from_request(&request(-5)).limit, DEFAULT_PAGE_SIZE);
        assert_eq!(QueryPlan::from_request(&request(25)).limit, 25);
    }

    #[test]
    fn test_default_order_is_newest_first() {
        let plan = QueryPlan::from_request(&request(10));
        assert_eq!(plan.order, OrderBy::NewestFirst);

        let page = plan.evaluate(sample());
        let names: Vec<_> = page.rows.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "Bob", "Carol", "Dave"]);
    }

    #[test]
    fn test_only_first_directive_applies() {
        let mut req = request(10);
        req.order = vec![SortDirective::new(4, "desc"), SortDirective::new(0, "asc")];
        let plan = QueryPlan::from_request(&req);
        assert_eq!(plan.order, OrderBy::Field(SortField::Salary, SortOrder::Desc));

        let page = plan.evaluate(sample());
        assert_eq!(page.rows[0].name, "Carol");
        // Equal salaries fall back to id order
        let (a, b) = (&page.rows[1], &page.rows[2]);
        assert_eq!(a.salary, b.salary);
        assert!(a.id < b.id);
    }

    #[test]
    fn test_unknown_column_falls_back_to_default() {
        let mut req = request(10);
        req.columns.push(ColumnDescriptor::data("createdAt"));
        req.order = vec![SortDirective::new(5, "asc")];
        assert_eq!(QueryPlan::from_request(&req).order, OrderBy::NewestFirst);
    }

    #[test]
    fn test_column_match_is_case_insensitive() {
        let mut req = request(10);
        req.columns[1] = ColumnDescriptor::data("DATEOFBIRTH");
        req.order = vec![SortDirective::new(1, "DESC")];
        assert_eq!(
            QueryPlan::from_request(&req).order,
            OrderBy::Field(SortField::DateOfBirth, SortOrder::Desc)
        );
    }

    #[test]
    fn test_search_filters_name_or_phone() {
        let mut req = request(10);
        req.search_value = Some("  ALI ".to_string());
        let page = QueryPlan::from_request(&req).evaluate(sample());
        assert_eq!(page.records_total, 4);
        assert_eq!(page.records_filtered, 1);
        assert_eq!(page.rows[0].name, "alice");

        req.search_value = Some("777".to_string());
        let page = QueryPlan::from_request(&req).evaluate(sample());
        assert_eq!(page.records_filtered, 1);
        assert_eq!(page.rows[0].name, "Dave");
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let mut req = request(10);
        req.search_value = Some("   ".to_string());
        assert_eq!(QueryPlan::from_request(&req).search, None);
    }

    #[test]
    fn test_pages_cover_filtered_set_exactly_once() {
        let contacts: Vec<Contact> = (0..23)
            .map(|i| contact(&format!("Same {}", i % 3), "555", 100, 0))
            .collect();

        let mut req = request(5);
        req.order = vec![SortDirective::new(0, "asc")];

        let mut seen: Vec<Uuid> = Vec::new();
        let mut start = 0;
        loop {
            req.start = start;
            let plan = QueryPlan::from_request(&req);
            let page = plan.evaluate(contacts.clone());
            assert!(page.rows.len() as u64 <= plan.limit);
            assert!(page.records_filtered <= page.records_total);
            // Same window twice gives the same page
            assert_eq!(plan.evaluate(contacts.clone()), page);
            if page.rows.is_empty() {
                break;
            }
            seen.extend(page.rows.iter().map(|c| c.id));
            start += 5;
        }

        let mut unique = seen.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(seen.len(), 23);
        assert_eq!(unique.len(), 23);
    }

    #[test]
    fn test_order_sql_is_whitelisted() {
        assert_eq!(
            OrderBy::Field(SortField::Salary, SortOrder::Desc).to_sql(),
            "salary_cents DESC, id ASC"
        );
        assert_eq!(OrderBy::NewestFirst.to_sql(), "created_at DESC, id ASC");
    }
}
